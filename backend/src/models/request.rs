use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Discriminant of the polymorphic request envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Leave,
    Overtime,
    Correction,
}

impl RequestType {
    pub fn db_value(&self) -> &'static str {
        match self {
            RequestType::Leave => "leave",
            RequestType::Overtime => "overtime",
            RequestType::Correction => "correction",
        }
    }
}

/// Workflow status. The `approved_n{k}` values mark a request that cleared
/// level k and is waiting on the next one; `approved`, `rejected` and
/// `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    ApprovedN1,
    ApprovedN2,
    ApprovedN3,
    Approved,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn db_value(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::ApprovedN1 => "approved_n1",
            RequestStatus::ApprovedN2 => "approved_n2",
            RequestStatus::ApprovedN3 => "approved_n3",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Approved | RequestStatus::Rejected | RequestStatus::Cancelled
        )
    }

    /// Intermediate status after clearing the given level with more levels
    /// remaining. Levels are 1-based; chains deeper than 3 are not supported.
    pub fn partial(level: i32) -> Option<RequestStatus> {
        match level {
            1 => Some(RequestStatus::ApprovedN1),
            2 => Some(RequestStatus::ApprovedN2),
            3 => Some(RequestStatus::ApprovedN3),
            _ => None,
        }
    }
}

/// Per-level decision state. Stays `none` until the level is acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LevelAction {
    #[default]
    None,
    Approved,
    Rejected,
}

impl LevelAction {
    pub fn db_value(&self) -> &'static str {
        match self {
            LevelAction::None => "none",
            LevelAction::Approved => "approved",
            LevelAction::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Annual,
    Sick,
    Personal,
    Other,
}

/// Type-specific request payload. Stored as a tagged JSON document on the
/// envelope row so all three variants share one lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestPayload {
    Leave {
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        day_count: f64,
        #[serde(default)]
        reason: Option<String>,
    },
    Overtime {
        date: NaiveDate,
        planned_hours: f64,
        #[serde(default)]
        reason: Option<String>,
    },
    Correction {
        date: NaiveDate,
        original_clock_in: Option<NaiveDateTime>,
        original_clock_out: Option<NaiveDateTime>,
        requested_clock_in: Option<NaiveDateTime>,
        requested_clock_out: Option<NaiveDateTime>,
        #[serde(default)]
        reason: Option<String>,
    },
}

impl RequestPayload {
    pub fn request_type(&self) -> RequestType {
        match self {
            RequestPayload::Leave { .. } => RequestType::Leave,
            RequestPayload::Overtime { .. } => RequestType::Overtime,
            RequestPayload::Correction { .. } => RequestType::Correction,
        }
    }

    /// Monetary/hour scope used against a delegation's `max_amount`.
    /// Corrections carry no amount.
    pub fn amount(&self) -> Option<f64> {
        match self {
            RequestPayload::Leave { day_count, .. } => Some(*day_count),
            RequestPayload::Overtime { planned_hours, .. } => Some(*planned_hours),
            RequestPayload::Correction { .. } => None,
        }
    }
}

/// Polymorphic request envelope. Never physically deleted; cancellation is a
/// terminal status, not a delete.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Request {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub request_type: RequestType,
    pub payload: Json<RequestPayload>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub cancellation_reason: Option<String>,
}

impl Request {
    pub fn new(requester_id: Uuid, payload: RequestPayload) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            requester_id,
            request_type: payload.request_type(),
            payload: Json(payload),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
        }
    }
}

/// One step of the approval chain.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApprovalLevel {
    pub id: Uuid,
    pub request_id: Uuid,
    pub level: i32,
    /// Approver originally assigned to this level.
    pub approver_id: Uuid,
    /// Whoever actually acted; differs from `approver_id` when delegated.
    pub acted_by_id: Option<Uuid>,
    pub delegation_id: Option<Uuid>,
    pub action: LevelAction,
    pub comment: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
}

impl ApprovalLevel {
    pub fn new(request_id: Uuid, level: i32, approver_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            level,
            approver_id,
            acted_by_id: None,
            delegation_id: None,
            action: LevelAction::None,
            comment: None,
            acted_at: None,
        }
    }
}

/// A request together with its ordered level records.
#[derive(Debug, Clone, Serialize)]
pub struct RequestWithLevels {
    #[serde(flatten)]
    pub request: Request,
    pub levels: Vec<ApprovalLevel>,
}

impl RequestWithLevels {
    /// Lowest-numbered unacted level, i.e. the one waiting for a decision.
    /// `None` for terminal requests.
    pub fn current_level(&self) -> Option<&ApprovalLevel> {
        self.levels
            .iter()
            .filter(|l| l.action == LevelAction::None)
            .min_by_key(|l| l.level)
    }

    pub fn last_level_number(&self) -> i32 {
        self.levels.iter().map(|l| l.level).max().unwrap_or(0)
    }
}

/// Outcome of an approve/reject transition.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDecision {
    #[serde(flatten)]
    pub request: RequestWithLevels,
    pub is_final: bool,
    pub next_level: Option<i32>,
}

/// Body for approve/reject commands. Comments are optional on approve and
/// informative-only on reject.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DecisionBody {
    #[serde(default)]
    pub comment: Option<String>,
}

/// Body for administrative cancellation of an approved request.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelRequestBody {
    pub reason: String,
}
