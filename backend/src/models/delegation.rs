use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::request::RequestType;

/// Scope of a delegation. `All` covers every request type; the other values
/// restrict the grant to one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DelegationType {
    All,
    Leave,
    Overtime,
    Correction,
    Expense,
}

impl DelegationType {
    pub fn db_value(&self) -> &'static str {
        match self {
            DelegationType::All => "all",
            DelegationType::Leave => "leave",
            DelegationType::Overtime => "overtime",
            DelegationType::Correction => "correction",
            DelegationType::Expense => "expense",
        }
    }

    /// Whether this delegation can stand in for approvals of the given
    /// request type.
    pub fn covers(&self, request_type: RequestType) -> bool {
        match self {
            DelegationType::All => true,
            DelegationType::Leave => request_type == RequestType::Leave,
            DelegationType::Overtime => request_type == RequestType::Overtime,
            DelegationType::Correction => request_type == RequestType::Correction,
            DelegationType::Expense => false,
        }
    }

    pub fn is_specific(&self) -> bool {
        !matches!(self, DelegationType::All)
    }
}

/// Status derived at query time from `{is_active, start_date, end_date}`
/// against "today". Precedence: cancelled > upcoming > active > expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    Active,
    Upcoming,
    Expired,
    Cancelled,
}

/// Inclusive window check used by both overlap detection and resolution.
pub fn windows_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// A time-bounded grant letting `delegate_id` act as `delegator_id` for
/// approval purposes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Delegation {
    pub id: Uuid,
    pub delegator_id: Uuid,
    pub delegate_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub delegation_type: DelegationType,
    /// Requesters this delegation does not cover.
    pub excluded_employee_ids: Json<Vec<Uuid>>,
    /// Optional upper bound on the request's day/hour amount.
    pub max_amount: Option<f64>,
    pub is_active: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub cancellation_reason: Option<String>,
    pub delegate_notified: bool,
    pub team_notified: bool,
    pub expiry_notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delegation {
    pub fn new(
        delegator_id: Uuid,
        delegate_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        delegation_type: DelegationType,
        excluded_employee_ids: Vec<Uuid>,
        max_amount: Option<f64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            delegator_id,
            delegate_id,
            start_date,
            end_date,
            delegation_type,
            excluded_employee_ids: Json(excluded_employee_ids),
            max_amount,
            is_active: true,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            delegate_notified: false,
            team_notified: false,
            expiry_notified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn window_contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn status_on(&self, today: NaiveDate) -> DelegationStatus {
        if !self.is_active {
            DelegationStatus::Cancelled
        } else if today < self.start_date {
            DelegationStatus::Upcoming
        } else if today > self.end_date {
            DelegationStatus::Expired
        } else {
            DelegationStatus::Active
        }
    }

    pub fn excludes(&self, requester_id: Uuid) -> bool {
        self.excluded_employee_ids.0.contains(&requester_id)
    }

    /// True when the request's amount fits under `max_amount`. Unbounded
    /// delegations and amount-less requests always fit.
    pub fn allows_amount(&self, amount: Option<f64>) -> bool {
        match (self.max_amount, amount) {
            (Some(max), Some(amount)) => amount <= max,
            _ => true,
        }
    }
}

/// View row for listings: the record plus its derived status.
#[derive(Debug, Clone, Serialize)]
pub struct DelegationView {
    #[serde(flatten)]
    pub delegation: Delegation,
    pub status: DelegationStatus,
}

/// Creation result; the subordinate warning is informational and never blocks.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedDelegation {
    #[serde(flatten)]
    pub delegation: Delegation,
    pub subordinate_warning: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDelegationBody {
    pub delegate_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub delegation_type: DelegationType,
    #[serde(default)]
    pub excluded_employee_ids: Vec<Uuid>,
    #[serde(default)]
    pub max_amount: Option<f64>,
}

/// Adjustable fields while a delegation is still active and not expired.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateDelegationBody {
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub excluded_employee_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub max_amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelDelegationBody {
    pub reason: String,
}

/// Listing scope for the delegations endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DelegationScope {
    /// Delegations the caller created.
    #[default]
    Mine,
    /// Delegations naming the caller as delegate.
    Received,
    /// Administrative view of everything.
    All,
}
