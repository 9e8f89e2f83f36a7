//! Balance ledger collaborator.
//!
//! Invoked by the workflow engine on the terminal `approved` transition of a
//! leave request. The engine treats failures here as best-effort: they are
//! logged and reconciled out-of-band, never surfaced to the approver.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use uuid::Uuid;

use crate::db::connection::DbPool;
use crate::models::request::LeaveType;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no balance row for employee {employee_id} ({leave_type}, {year})")]
    MissingBalance {
        employee_id: Uuid,
        leave_type: &'static str,
        year: i32,
    },
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    /// Deduct `days` from the employee's balance for the year containing
    /// `as_of`.
    async fn deduct(
        &self,
        employee_id: Uuid,
        leave_type: LeaveType,
        days: f64,
        as_of: NaiveDate,
    ) -> Result<(), LedgerError>;
}

fn leave_type_key(leave_type: LeaveType) -> &'static str {
    match leave_type {
        LeaveType::Annual => "annual",
        LeaveType::Sick => "sick",
        LeaveType::Personal => "personal",
        LeaveType::Other => "other",
    }
}

#[derive(Debug, Clone)]
pub struct SqlBalanceLedger {
    pool: DbPool,
}

impl SqlBalanceLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceLedger for SqlBalanceLedger {
    async fn deduct(
        &self,
        employee_id: Uuid,
        leave_type: LeaveType,
        days: f64,
        as_of: NaiveDate,
    ) -> Result<(), LedgerError> {
        let year = as_of.year();
        let key = leave_type_key(leave_type);
        let result = sqlx::query(
            "UPDATE leave_balances SET remaining_days = remaining_days - $1, updated_at = now() \
             WHERE employee_id = $2 AND leave_type = $3 AND year = $4",
        )
        .bind(days)
        .bind(employee_id)
        .bind(key)
        .bind(year)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::MissingBalance {
                employee_id,
                leave_type: key,
                year,
            });
        }
        Ok(())
    }
}
