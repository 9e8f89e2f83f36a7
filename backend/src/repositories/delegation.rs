//! Delegation store: who may substitute for whom, when, and under which
//! constraints.
//!
//! Resolution-time matching (type precedence, exclusion lists, amount bounds)
//! lives in the resolver; this store answers the persistence-shaped
//! questions: overlap probes at creation time, candidate rows for a
//! `(delegate, delegator, date)` tuple, and the conditional deactivation
//! guard.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::delegation::{Delegation, DelegationType};

const DELEGATION_COLUMNS: &str = "id, delegator_id, delegate_id, start_date, end_date, \
     delegation_type, excluded_employee_ids, max_amount, is_active, cancelled_at, cancelled_by, \
     cancellation_reason, delegate_notified, team_notified, expiry_notified, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DelegationStore: Send + Sync {
    async fn insert(&self, delegation: &Delegation) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Delegation>, AppError>;

    /// First active delegation of the same type for the same delegator whose
    /// window intersects `[start, end]` (inclusive boundaries count).
    /// `exclude_id` skips the record being updated when re-checking an
    /// extension.
    async fn find_active_overlapping(
        &self,
        delegator_id: Uuid,
        delegation_type: DelegationType,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<Delegation>, AppError>;

    /// Active delegations from `delegator_id` to `delegate_id` whose window
    /// contains `on_date`, regardless of type. Type filtering and precedence
    /// are the resolver's concern.
    async fn find_candidates(
        &self,
        delegate_id: Uuid,
        delegator_id: Uuid,
        on_date: NaiveDate,
    ) -> Result<Vec<Delegation>, AppError>;

    /// Deactivate, conditioned on the record still being active. Returns rows
    /// affected: 0 means it was already cancelled.
    async fn deactivate(
        &self,
        id: Uuid,
        actor_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    /// Persist adjusted constraints (end_date, exclusions, max_amount),
    /// conditioned on the record still being active.
    async fn update_constraints(&self, delegation: &Delegation) -> Result<u64, AppError>;

    async fn set_notification_flags(
        &self,
        id: Uuid,
        delegate_notified: bool,
        team_notified: bool,
    ) -> Result<(), AppError>;

    async fn list_for_delegate(
        &self,
        delegate_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Delegation>, AppError>;

    async fn list_for_delegator(
        &self,
        delegator_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Delegation>, AppError>;

    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Delegation>, AppError>;

    /// Active delegations whose window has passed and which have not yet had
    /// their expiry notification emitted. Used by the expiry worker.
    async fn find_expired_unnotified(&self, today: NaiveDate)
        -> Result<Vec<Delegation>, AppError>;

    async fn mark_expiry_notified(&self, id: Uuid) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct SqlDelegationStore {
    pool: DbPool,
}

impl SqlDelegationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DelegationStore for SqlDelegationStore {
    async fn insert(&self, delegation: &Delegation) -> Result<(), AppError> {
        let query = format!(
            "INSERT INTO delegations ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, \
             $12, $13, $14, $15, $16, $17)",
            DELEGATION_COLUMNS
        );
        sqlx::query(&query)
            .bind(delegation.id)
            .bind(delegation.delegator_id)
            .bind(delegation.delegate_id)
            .bind(delegation.start_date)
            .bind(delegation.end_date)
            .bind(delegation.delegation_type.db_value())
            .bind(&delegation.excluded_employee_ids)
            .bind(delegation.max_amount)
            .bind(delegation.is_active)
            .bind(delegation.cancelled_at)
            .bind(delegation.cancelled_by)
            .bind(&delegation.cancellation_reason)
            .bind(delegation.delegate_notified)
            .bind(delegation.team_notified)
            .bind(delegation.expiry_notified)
            .bind(delegation.created_at)
            .bind(delegation.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Delegation>, AppError> {
        let query = format!("SELECT {} FROM delegations WHERE id = $1", DELEGATION_COLUMNS);
        let row = sqlx::query_as::<_, Delegation>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_active_overlapping(
        &self,
        delegator_id: Uuid,
        delegation_type: DelegationType,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<Delegation>, AppError> {
        let query = format!(
            "SELECT {} FROM delegations \
             WHERE delegator_id = $1 AND delegation_type = $2 AND is_active = TRUE \
             AND start_date <= $4 AND end_date >= $3 \
             AND ($5::uuid IS NULL OR id <> $5) \
             ORDER BY start_date ASC LIMIT 1",
            DELEGATION_COLUMNS
        );
        let row = sqlx::query_as::<_, Delegation>(&query)
            .bind(delegator_id)
            .bind(delegation_type.db_value())
            .bind(start)
            .bind(end)
            .bind(exclude_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_candidates(
        &self,
        delegate_id: Uuid,
        delegator_id: Uuid,
        on_date: NaiveDate,
    ) -> Result<Vec<Delegation>, AppError> {
        let query = format!(
            "SELECT {} FROM delegations \
             WHERE delegate_id = $1 AND delegator_id = $2 AND is_active = TRUE \
             AND start_date <= $3 AND end_date >= $3",
            DELEGATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Delegation>(&query)
            .bind(delegate_id)
            .bind(delegator_id)
            .bind(on_date)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn deactivate(
        &self,
        id: Uuid,
        actor_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE delegations \
             SET is_active = FALSE, cancelled_at = $1, cancelled_by = $2, \
                 cancellation_reason = $3, updated_at = $4 \
             WHERE id = $5 AND is_active = TRUE",
        )
        .bind(at)
        .bind(actor_id)
        .bind(reason)
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update_constraints(&self, delegation: &Delegation) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE delegations \
             SET end_date = $1, excluded_employee_ids = $2, max_amount = $3, updated_at = $4 \
             WHERE id = $5 AND is_active = TRUE",
        )
        .bind(delegation.end_date)
        .bind(&delegation.excluded_employee_ids)
        .bind(delegation.max_amount)
        .bind(delegation.updated_at)
        .bind(delegation.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn set_notification_flags(
        &self,
        id: Uuid,
        delegate_notified: bool,
        team_notified: bool,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE delegations SET delegate_notified = $1, team_notified = $2, updated_at = $3 \
             WHERE id = $4",
        )
        .bind(delegate_notified)
        .bind(team_notified)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_delegate(
        &self,
        delegate_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Delegation>, AppError> {
        let query = format!(
            "SELECT {} FROM delegations WHERE delegate_id = $1 \
             ORDER BY start_date DESC LIMIT $2 OFFSET $3",
            DELEGATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Delegation>(&query)
            .bind(delegate_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_for_delegator(
        &self,
        delegator_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Delegation>, AppError> {
        let query = format!(
            "SELECT {} FROM delegations WHERE delegator_id = $1 \
             ORDER BY start_date DESC LIMIT $2 OFFSET $3",
            DELEGATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Delegation>(&query)
            .bind(delegator_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Delegation>, AppError> {
        let query = format!(
            "SELECT {} FROM delegations ORDER BY start_date DESC LIMIT $1 OFFSET $2",
            DELEGATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Delegation>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_expired_unnotified(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Delegation>, AppError> {
        let query = format!(
            "SELECT {} FROM delegations \
             WHERE is_active = TRUE AND expiry_notified = FALSE AND end_date < $1",
            DELEGATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Delegation>(&query)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn mark_expiry_notified(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE delegations SET expiry_notified = TRUE, updated_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_delegation_store_can_be_created() {
        let _mock = MockDelegationStore::new();
    }

    #[test]
    fn mock_delegation_store_is_send_sync() {
        fn check_send_sync<T: Send + Sync>() {}
        check_send_sync::<MockDelegationStore>();
    }
}
