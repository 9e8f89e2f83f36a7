use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    DelegateAssigned,
    DelegationCancelled,
    TeamInformed,
    DelegationExpired,
}

impl NotificationType {
    pub fn db_value(&self) -> &'static str {
        match self {
            NotificationType::DelegateAssigned => "delegate_assigned",
            NotificationType::DelegationCancelled => "delegation_cancelled",
            NotificationType::TeamInformed => "team_informed",
            NotificationType::DelegationExpired => "delegation_expired",
        }
    }
}

/// Best-effort side-effect row; never feeds back into workflow state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DelegationNotification {
    pub id: Uuid,
    pub delegation_id: Uuid,
    pub recipient_id: Uuid,
    pub notification_type: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl DelegationNotification {
    pub fn new(
        delegation_id: Uuid,
        recipient_id: Uuid,
        notification_type: NotificationType,
        message: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            delegation_id,
            recipient_id,
            notification_type,
            message,
            is_read: false,
            created_at: Utc::now(),
            read_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_type_serde_snake_case() {
        let kind: NotificationType = serde_json::from_str("\"delegation_expired\"").unwrap();
        assert_eq!(kind, NotificationType::DelegationExpired);
        assert_eq!(
            serde_json::to_value(NotificationType::DelegateAssigned).unwrap(),
            serde_json::json!("delegate_assigned")
        );
    }
}
