//! Employee/org directory collaborator.
//!
//! Keeps organizational-chart knowledge out of the workflow core: the engine
//! only ever asks "who approves for this employee, in order" and "who reports
//! to this manager".

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::connection::DbPool;
use crate::error::AppError;

/// Upper bound on chain walks; org charts deeper than this indicate a data
/// problem (or a cycle) rather than a real hierarchy.
const MAX_CHAIN_DEPTH: usize = 10;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Ordered approver chain for the employee: direct manager first, then
    /// the manager's manager, and so on.
    async fn manager_chain_of(&self, employee_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    async fn direct_reports_of(&self, manager_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    async fn display_name(&self, employee_id: Uuid) -> Result<Option<String>, AppError>;
}

#[derive(Debug, Clone)]
pub struct SqlEmployeeDirectory {
    pool: DbPool,
}

impl SqlEmployeeDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for SqlEmployeeDirectory {
    async fn manager_chain_of(&self, employee_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let mut chain = Vec::new();
        let mut current = employee_id;
        for _ in 0..MAX_CHAIN_DEPTH {
            let manager: Option<Option<Uuid>> =
                sqlx::query_scalar("SELECT manager_id FROM employees WHERE id = $1")
                    .bind(current)
                    .fetch_optional(&self.pool)
                    .await?;
            match manager.flatten() {
                Some(manager_id) if !chain.contains(&manager_id) && manager_id != employee_id => {
                    chain.push(manager_id);
                    current = manager_id;
                }
                _ => break,
            }
        }
        Ok(chain)
    }

    async fn direct_reports_of(&self, manager_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let rows: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM employees WHERE manager_id = $1")
            .bind(manager_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn display_name(&self, employee_id: Uuid) -> Result<Option<String>, AppError> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT display_name FROM employees WHERE id = $1")
                .bind(employee_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(name)
    }
}
