//! Request store: the polymorphic request envelope plus its per-level
//! approval sub-records.
//!
//! The store trait is mockable with mockall so the workflow engine can be
//! tested without a database. The SQL implementation keeps every multi-row
//! mutation inside one transaction and expresses the race guards as
//! conditional UPDATE predicates, reporting `rows_affected` back to the
//! engine.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::request::{
    ApprovalLevel, LevelAction, Request, RequestStatus, RequestType, RequestWithLevels,
};
use crate::repositories::common::push_clause;
use crate::repositories::transaction::{begin_transaction, commit_transaction, rollback_transaction};

const REQUEST_COLUMNS: &str = "id, requester_id, request_type, payload, status, created_at, \
     updated_at, cancelled_at, cancelled_by, cancellation_reason";

const LEVEL_COLUMNS: &str = "id, request_id, level, approver_id, acted_by_id, delegation_id, \
     action, comment, acted_at";

/// Values written onto a level row when an actor decides it.
#[derive(Debug, Clone)]
pub struct LevelActionRecord {
    pub action: LevelAction,
    pub acted_by_id: Uuid,
    pub delegation_id: Option<Uuid>,
    pub comment: Option<String>,
    pub acted_at: DateTime<Utc>,
}

/// Filters for request list queries.
#[derive(Debug, Clone, Default)]
pub struct RequestListFilters {
    pub status: Option<RequestStatus>,
    pub requester_id: Option<Uuid>,
    pub request_type: Option<RequestType>,
    /// Only requests whose current (lowest unacted) level names this
    /// approver.
    pub awaiting_approver: Option<Uuid>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Persist a new request together with its ordered level rows, atomically.
    async fn insert(&self, request: &Request, levels: &[ApprovalLevel]) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RequestWithLevels>, AppError>;

    /// Leave requests for the employee whose date range intersects
    /// `[start, end]`, excluding terminally rejected/cancelled ones.
    async fn find_overlapping_leave(
        &self,
        requester_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Request>, AppError>;

    /// Write the level decision and advance the request status, in one
    /// atomic unit, conditioned on the level still being unacted. Returns the
    /// number of level rows updated: 0 means a concurrent actor won the race
    /// and nothing was written.
    async fn record_level_action(
        &self,
        request_id: Uuid,
        level: i32,
        record: &LevelActionRecord,
        new_status: RequestStatus,
    ) -> Result<u64, AppError>;

    /// Flip an `approved` request to `cancelled`, stamping cancellation
    /// metadata. Conditioned on the status still being `approved`; returns
    /// rows affected.
    async fn cancel_approved(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    async fn list(
        &self,
        filters: &RequestListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Request>, AppError>;
}

#[derive(Debug, Clone)]
pub struct SqlRequestStore {
    pool: DbPool,
}

impl SqlRequestStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestStore for SqlRequestStore {
    async fn insert(&self, request: &Request, levels: &[ApprovalLevel]) -> Result<(), AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        let query = format!(
            "INSERT INTO requests ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            REQUEST_COLUMNS
        );
        sqlx::query(&query)
            .bind(request.id)
            .bind(request.requester_id)
            .bind(request.request_type.db_value())
            .bind(&request.payload)
            .bind(request.status.db_value())
            .bind(request.created_at)
            .bind(request.updated_at)
            .bind(request.cancelled_at)
            .bind(request.cancelled_by)
            .bind(&request.cancellation_reason)
            .execute(&mut *tx)
            .await?;

        for level in levels {
            let query = format!(
                "INSERT INTO approval_levels ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                LEVEL_COLUMNS
            );
            sqlx::query(&query)
                .bind(level.id)
                .bind(level.request_id)
                .bind(level.level)
                .bind(level.approver_id)
                .bind(level.acted_by_id)
                .bind(level.delegation_id)
                .bind(level.action.db_value())
                .bind(&level.comment)
                .bind(level.acted_at)
                .execute(&mut *tx)
                .await?;
        }

        commit_transaction(tx).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RequestWithLevels>, AppError> {
        let query = format!("SELECT {} FROM requests WHERE id = $1", REQUEST_COLUMNS);
        let request = sqlx::query_as::<_, Request>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(request) = request else {
            return Ok(None);
        };

        let query = format!(
            "SELECT {} FROM approval_levels WHERE request_id = $1 ORDER BY level ASC",
            LEVEL_COLUMNS
        );
        let levels = sqlx::query_as::<_, ApprovalLevel>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(RequestWithLevels { request, levels }))
    }

    async fn find_overlapping_leave(
        &self,
        requester_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Request>, AppError> {
        let query = format!(
            "SELECT {} FROM requests \
             WHERE requester_id = $1 AND request_type = 'leave' \
             AND status NOT IN ('rejected', 'cancelled') \
             AND (payload->>'start_date')::date <= $3 \
             AND (payload->>'end_date')::date >= $2 \
             ORDER BY created_at ASC",
            REQUEST_COLUMNS
        );
        let rows = sqlx::query_as::<_, Request>(&query)
            .bind(requester_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn record_level_action(
        &self,
        request_id: Uuid,
        level: i32,
        record: &LevelActionRecord,
        new_status: RequestStatus,
    ) -> Result<u64, AppError> {
        let mut tx = begin_transaction(&self.pool).await?;

        // Optimistic guard: only the first actor to reach the unacted level
        // row wins; everyone else sees zero rows affected.
        let result = sqlx::query(
            "UPDATE approval_levels \
             SET action = $1, acted_by_id = $2, delegation_id = $3, comment = $4, acted_at = $5 \
             WHERE request_id = $6 AND level = $7 AND action = 'none'",
        )
        .bind(record.action.db_value())
        .bind(record.acted_by_id)
        .bind(record.delegation_id)
        .bind(&record.comment)
        .bind(record.acted_at)
        .bind(request_id)
        .bind(level)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            rollback_transaction(tx).await?;
            return Ok(0);
        }

        sqlx::query(
            "UPDATE requests SET status = $1, updated_at = $2 \
             WHERE id = $3 AND status NOT IN ('approved', 'rejected', 'cancelled')",
        )
        .bind(new_status.db_value())
        .bind(record.acted_at)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

        commit_transaction(tx).await?;
        Ok(result.rows_affected())
    }

    async fn cancel_approved(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE requests \
             SET status = 'cancelled', cancelled_at = $1, cancelled_by = $2, \
                 cancellation_reason = $3, updated_at = $4 \
             WHERE id = $5 AND status = 'approved'",
        )
        .bind(at)
        .bind(actor_id)
        .bind(reason)
        .bind(at)
        .bind(request_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list(
        &self,
        filters: &RequestListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Request>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM requests", REQUEST_COLUMNS));
        let mut has_clause = false;
        if let Some(requester_id) = filters.requester_id {
            push_clause(&mut builder, &mut has_clause);
            builder.push("requester_id = ").push_bind(requester_id);
        }
        if let Some(status) = filters.status {
            push_clause(&mut builder, &mut has_clause);
            builder.push("status = ").push_bind(status.db_value());
        }
        if let Some(request_type) = filters.request_type {
            push_clause(&mut builder, &mut has_clause);
            builder
                .push("request_type = ")
                .push_bind(request_type.db_value());
        }
        if let Some(approver_id) = filters.awaiting_approver {
            // Current level only: an unacted level for this approver with no
            // lower-numbered unacted level in front of it.
            push_clause(&mut builder, &mut has_clause);
            builder
                .push(
                    "status NOT IN ('approved', 'rejected', 'cancelled') \
                     AND EXISTS (SELECT 1 FROM approval_levels al \
                     WHERE al.request_id = requests.id AND al.action = 'none' \
                     AND al.approver_id = ",
                )
                .push_bind(approver_id)
                .push(
                    " AND NOT EXISTS (SELECT 1 FROM approval_levels lower \
                     WHERE lower.request_id = requests.id AND lower.action = 'none' \
                     AND lower.level < al.level))",
                );
        }
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        builder
            .build_query_as::<Request>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_request_store_can_be_created() {
        let _mock = MockRequestStore::new();
    }

    #[test]
    fn mock_request_store_is_send_sync() {
        fn check_send_sync<T: Send + Sync>() {}
        check_send_sync::<MockRequestStore>();
    }
}
