//! Notification sink collaborator.
//!
//! Enqueues `DelegationNotification` rows. Callers treat enqueue failures as
//! best-effort: logged, never rolled back against the primary transition.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::db::connection::DbPool;
use crate::models::notification::{DelegationNotification, NotificationType};
use crate::repositories::notification::insert_notification;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn enqueue(
        &self,
        delegation_id: Uuid,
        recipient_id: Uuid,
        kind: NotificationType,
        message: String,
    ) -> Result<(), SinkError>;
}

#[derive(Debug, Clone)]
pub struct SqlNotificationSink {
    pool: DbPool,
}

impl SqlNotificationSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for SqlNotificationSink {
    async fn enqueue(
        &self,
        delegation_id: Uuid,
        recipient_id: Uuid,
        kind: NotificationType,
        message: String,
    ) -> Result<(), SinkError> {
        let notification = DelegationNotification::new(delegation_id, recipient_id, kind, message);
        insert_notification(&self.pool, &notification)
            .await
            .map_err(|e| SinkError::Unavailable(format!("{:?}", e)))
    }
}
