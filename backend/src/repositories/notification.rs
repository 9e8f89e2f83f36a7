//! Delegation notification rows: insert path used by the notification sink,
//! plus the read model (list, mark read).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::connection::DbPool;
use crate::error::AppError;
use crate::models::notification::DelegationNotification;

const NOTIFICATION_COLUMNS: &str =
    "id, delegation_id, recipient_id, notification_type, message, is_read, created_at, read_at";

pub async fn insert_notification(
    pool: &DbPool,
    notification: &DelegationNotification,
) -> Result<(), AppError> {
    let query = format!(
        "INSERT INTO delegation_notifications ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        NOTIFICATION_COLUMNS
    );
    sqlx::query(&query)
        .bind(notification.id)
        .bind(notification.delegation_id)
        .bind(notification.recipient_id)
        .bind(notification.notification_type.db_value())
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .bind(notification.read_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_for_recipient(
    pool: &DbPool,
    recipient_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<DelegationNotification>, AppError> {
    let query = format!(
        "SELECT {} FROM delegation_notifications WHERE recipient_id = $1 \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        NOTIFICATION_COLUMNS
    );
    let rows = sqlx::query_as::<_, DelegationNotification>(&query)
        .bind(recipient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Marks one of the recipient's notifications read. Returns rows affected so
/// the caller can distinguish "not yours / not found".
pub async fn mark_read(
    pool: &DbPool,
    id: Uuid,
    recipient_id: Uuid,
    at: DateTime<Utc>,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE delegation_notifications SET is_read = TRUE, read_at = $1 \
         WHERE id = $2 AND recipient_id = $3 AND is_read = FALSE",
    )
    .bind(at)
    .bind(id)
    .bind(recipient_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
