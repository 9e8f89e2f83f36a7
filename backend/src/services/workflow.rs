//! Workflow engine: the approval state machine.
//!
//! Owns every request transition: computes the required level sequence at
//! creation, applies approve/reject/cancel atomically through the request
//! store's conditional writes, and dispatches terminal side effects. Side
//! effects are best-effort by design: an authorized human decision is the
//! authoritative fact and is never lost to a downstream bookkeeping fault.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::models::request::{
    ApprovalLevel, LevelAction, Request, RequestDecision, RequestPayload, RequestStatus,
    RequestType, RequestWithLevels,
};
use crate::repositories::{
    DelegationStore, LevelActionRecord, RequestListFilters, RequestStore,
};
use crate::services::directory::EmployeeDirectory;
use crate::services::ledger::BalanceLedger;
use crate::services::resolver::{ApprovalResolver, ApprovalRights};
use crate::utils::time::today_local;
use crate::validation::rules::validate_request_payload;

/// Engine knobs lifted out of [`Config`] so tests can construct the engine
/// without touching the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub leave_approval_levels: usize,
    pub overtime_approval_levels: usize,
    pub correction_approval_levels: usize,
    pub time_zone: Tz,
}

impl EngineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            leave_approval_levels: config.leave_approval_levels,
            overtime_approval_levels: config.overtime_approval_levels,
            correction_approval_levels: config.correction_approval_levels,
            time_zone: config.time_zone,
        }
    }

    fn levels_for(&self, request_type: RequestType) -> usize {
        match request_type {
            RequestType::Leave => self.leave_approval_levels,
            RequestType::Overtime => self.overtime_approval_levels,
            RequestType::Correction => self.correction_approval_levels,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            leave_approval_levels: 2,
            overtime_approval_levels: 1,
            correction_approval_levels: 1,
            time_zone: chrono_tz::UTC,
        }
    }
}

#[derive(Clone)]
pub struct WorkflowEngine {
    requests: Arc<dyn RequestStore>,
    resolver: ApprovalResolver,
    directory: Arc<dyn EmployeeDirectory>,
    ledger: Arc<dyn BalanceLedger>,
    config: EngineConfig,
}

impl WorkflowEngine {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        delegations: Arc<dyn DelegationStore>,
        directory: Arc<dyn EmployeeDirectory>,
        ledger: Arc<dyn BalanceLedger>,
        config: EngineConfig,
    ) -> Self {
        let resolver = ApprovalResolver::new(delegations, Arc::clone(&directory));
        Self {
            requests,
            resolver,
            directory,
            ledger,
            config,
        }
    }

    fn today(&self) -> NaiveDate {
        today_local(&self.config.time_zone)
    }

    /// Create a request in `pending` and populate its approval chain from the
    /// requester's manager chain, truncated to the configured depth for the
    /// type. A request that resolves to zero required levels is terminal
    /// `approved` at creation.
    pub async fn create_request(
        &self,
        requester_id: Uuid,
        payload: RequestPayload,
    ) -> Result<RequestWithLevels, AppError> {
        let errors = validate_request_payload(&payload);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        if let RequestPayload::Leave {
            start_date,
            end_date,
            ..
        } = &payload
        {
            let conflicts = self
                .requests
                .find_overlapping_leave(requester_id, *start_date, *end_date)
                .await?;
            if !conflicts.is_empty() {
                let details: Vec<_> = conflicts
                    .iter()
                    .map(|conflict| {
                        let (start, end) = match &conflict.payload.0 {
                            RequestPayload::Leave {
                                start_date,
                                end_date,
                                ..
                            } => (Some(*start_date), Some(*end_date)),
                            _ => (None, None),
                        };
                        json!({
                            "request_id": conflict.id,
                            "request_type": conflict.request_type,
                            "status": conflict.status,
                            "start_date": start,
                            "end_date": end,
                        })
                    })
                    .collect();
                return Err(AppError::conflict(
                    "an existing leave request overlaps the requested period",
                    json!({ "conflicts": details }),
                ));
            }
        }

        let chain = self.directory.manager_chain_of(requester_id).await?;
        let depth = self.config.levels_for(payload.request_type()).min(chain.len());

        let mut request = Request::new(requester_id, payload);
        let levels: Vec<ApprovalLevel> = chain
            .iter()
            .take(depth)
            .enumerate()
            .map(|(idx, approver_id)| {
                ApprovalLevel::new(request.id, (idx + 1) as i32, *approver_id)
            })
            .collect();

        // No approvers to wait on: terminal at creation rather than stuck.
        if levels.is_empty() {
            request.status = RequestStatus::Approved;
        }

        self.requests.insert(&request, &levels).await?;

        let with_levels = RequestWithLevels { request, levels };
        if with_levels.request.status == RequestStatus::Approved {
            self.dispatch_terminal_side_effect(&with_levels.request).await;
        }
        Ok(with_levels)
    }

    pub async fn approve(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        comment: Option<String>,
    ) -> Result<RequestDecision, AppError> {
        let current = self.load(request_id).await?;
        let level = self.current_level_of(&current)?;

        let rights = self
            .resolver
            .resolve(actor_id, &current.request, &level, self.today())
            .await?;
        if !rights.authorized {
            return Err(AppError::Forbidden(
                "actor is not the approver for the current level".to_string(),
            ));
        }

        let is_final = level.level == current.last_level_number();
        let new_status = if is_final {
            RequestStatus::Approved
        } else {
            RequestStatus::partial(level.level).ok_or_else(|| {
                AppError::InvalidState(format!("unsupported chain depth at level {}", level.level))
            })?
        };

        let record = LevelActionRecord {
            action: LevelAction::Approved,
            acted_by_id: actor_id,
            delegation_id: rights.delegation_id,
            comment,
            acted_at: Utc::now(),
        };
        let affected = self
            .requests
            .record_level_action(request_id, level.level, &record, new_status)
            .await?;
        if affected == 0 {
            return Err(AppError::AlreadyProcessed(
                "this level was already decided by a concurrent actor".to_string(),
            ));
        }

        if is_final {
            self.dispatch_terminal_side_effect(&current.request).await;
        }

        let updated = self.load(request_id).await?;
        Ok(RequestDecision {
            request: updated,
            is_final,
            next_level: if is_final { None } else { Some(level.level + 1) },
        })
    }

    /// Rejection at any level ends the chain: the request goes terminal
    /// `rejected` and no further level is ever acted upon.
    pub async fn reject(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        comment: Option<String>,
    ) -> Result<RequestDecision, AppError> {
        let current = self.load(request_id).await?;
        let level = self.current_level_of(&current)?;

        let rights = self
            .resolver
            .resolve(actor_id, &current.request, &level, self.today())
            .await?;
        if !rights.authorized {
            return Err(AppError::Forbidden(
                "actor is not the approver for the current level".to_string(),
            ));
        }

        let record = LevelActionRecord {
            action: LevelAction::Rejected,
            acted_by_id: actor_id,
            delegation_id: rights.delegation_id,
            comment,
            acted_at: Utc::now(),
        };
        let affected = self
            .requests
            .record_level_action(request_id, level.level, &record, RequestStatus::Rejected)
            .await?;
        if affected == 0 {
            return Err(AppError::AlreadyProcessed(
                "this level was already decided by a concurrent actor".to_string(),
            ));
        }

        let updated = self.load(request_id).await?;
        Ok(RequestDecision {
            request: updated,
            is_final: true,
            next_level: None,
        })
    }

    /// Administrative undo after the fact. Only valid from terminal
    /// `approved`; the capability check itself belongs to the caller's
    /// middleware, the engine only receives its verdict. Does not reverse the
    /// balance deduction.
    pub async fn cancel_approved(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        is_admin: bool,
        reason: &str,
    ) -> Result<RequestWithLevels, AppError> {
        if !is_admin {
            return Err(AppError::Forbidden(
                "cancelling an approved request requires an administrative capability".to_string(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(AppError::Validation(vec![
                "reason: reason_required".to_string()
            ]));
        }

        let current = self.load(request_id).await?;
        if current.request.status != RequestStatus::Approved {
            return Err(AppError::InvalidState(format!(
                "only approved requests can be cancelled, current status is {}",
                current.request.status.db_value()
            )));
        }

        let affected = self
            .requests
            .cancel_approved(request_id, actor_id, reason, Utc::now())
            .await?;
        if affected == 0 {
            // Raced with another administrative action.
            return Err(AppError::InvalidState(
                "request is no longer in approved status".to_string(),
            ));
        }

        self.load(request_id).await
    }

    /// Read-only "can I approve this?" probe; performs no writes.
    pub async fn resolve_rights(
        &self,
        actor_id: Uuid,
        request_id: Uuid,
    ) -> Result<ApprovalRights, AppError> {
        let current = self.load(request_id).await?;
        let Some(level) = current.current_level().cloned() else {
            return Ok(ApprovalRights::unauthorized());
        };
        self.resolver
            .resolve(actor_id, &current.request, &level, self.today())
            .await
    }

    pub async fn get_request(&self, request_id: Uuid) -> Result<RequestWithLevels, AppError> {
        self.load(request_id).await
    }

    pub async fn list_requests(
        &self,
        filters: &RequestListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Request>, AppError> {
        self.requests.list(filters, limit, offset).await
    }

    async fn load(&self, request_id: Uuid) -> Result<RequestWithLevels, AppError> {
        self.requests
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".to_string()))
    }

    fn current_level_of(&self, current: &RequestWithLevels) -> Result<ApprovalLevel, AppError> {
        if current.request.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "request is already {}",
                current.request.status.db_value()
            )));
        }
        current.current_level().cloned().ok_or_else(|| {
            AppError::InvalidState("request has no level awaiting a decision".to_string())
        })
    }

    /// Terminal side-effect dispatch, keyed on the payload tag. Failures are
    /// logged for out-of-band reconciliation and never fail the transition.
    async fn dispatch_terminal_side_effect(&self, request: &Request) {
        match &request.payload.0 {
            RequestPayload::Leave {
                leave_type,
                day_count,
                ..
            } => {
                if let Err(err) = self
                    .ledger
                    .deduct(request.requester_id, *leave_type, *day_count, self.today())
                    .await
                {
                    tracing::warn!(
                        request_id = %request.id,
                        side_effect = "balance_deduction",
                        error = %err,
                        "terminal side effect failed; approval stands"
                    );
                }
            }
            RequestPayload::Overtime { .. } | RequestPayload::Correction { .. } => {}
        }
    }
}
