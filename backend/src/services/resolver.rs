//! Approval resolver: decides whether an actor may legitimately act on the
//! current level of a request, either directly or through an active
//! delegation.
//!
//! The matching rules live in a pure function over already-loaded candidate
//! delegations, so they can be tested exhaustively without a store; the
//! `ApprovalResolver` wrapper loads candidates and the delegator's display
//! name. Resolution performs no writes and is safe to call speculatively.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::delegation::Delegation;
use crate::models::request::{ApprovalLevel, Request};
use crate::repositories::DelegationStore;
use crate::services::directory::EmployeeDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    Direct,
    Delegated,
}

/// Resolution result, including substitution provenance when delegated.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalRights {
    pub authorized: bool,
    pub mode: Option<ApprovalMode>,
    pub delegation_id: Option<Uuid>,
    /// Display name of the nominal approver being substituted, when known.
    pub delegator_name: Option<String>,
}

impl ApprovalRights {
    pub fn unauthorized() -> Self {
        Self {
            authorized: false,
            mode: None,
            delegation_id: None,
            delegator_name: None,
        }
    }

    fn direct() -> Self {
        Self {
            authorized: true,
            mode: Some(ApprovalMode::Direct),
            delegation_id: None,
            delegator_name: None,
        }
    }

    fn delegated(delegation_id: Uuid) -> Self {
        Self {
            authorized: true,
            mode: Some(ApprovalMode::Delegated),
            delegation_id: Some(delegation_id),
            delegator_name: None,
        }
    }
}

/// Pure resolution over candidate delegations (all from the level's nominal
/// approver to the actor). A candidate matches when it is active on `today`,
/// its type covers the request's type, the requester is not excluded, and the
/// request's amount fits under `max_amount`. When both a type-specific and an
/// `all` delegation match, the specific one wins.
pub fn resolve(
    actor_id: Uuid,
    request: &Request,
    level: &ApprovalLevel,
    candidates: &[Delegation],
    today: NaiveDate,
) -> ApprovalRights {
    if actor_id == level.approver_id {
        return ApprovalRights::direct();
    }

    let best = candidates
        .iter()
        .filter(|d| {
            d.is_active
                && d.delegate_id == actor_id
                && d.delegator_id == level.approver_id
                && d.window_contains(today)
                && d.delegation_type.covers(request.request_type)
                && !d.excludes(request.requester_id)
                && d.allows_amount(request.payload.0.amount())
        })
        .min_by_key(|d| if d.delegation_type.is_specific() { 0 } else { 1 });

    match best {
        Some(delegation) => ApprovalRights::delegated(delegation.id),
        None => ApprovalRights::unauthorized(),
    }
}

/// Store-backed resolver used by the workflow engine and the read-only
/// rights endpoint.
#[derive(Clone)]
pub struct ApprovalResolver {
    delegations: Arc<dyn DelegationStore>,
    directory: Arc<dyn EmployeeDirectory>,
}

impl ApprovalResolver {
    pub fn new(
        delegations: Arc<dyn DelegationStore>,
        directory: Arc<dyn EmployeeDirectory>,
    ) -> Self {
        Self {
            delegations,
            directory,
        }
    }

    pub async fn resolve(
        &self,
        actor_id: Uuid,
        request: &Request,
        level: &ApprovalLevel,
        today: NaiveDate,
    ) -> Result<ApprovalRights, AppError> {
        if actor_id == level.approver_id {
            return Ok(ApprovalRights::direct());
        }

        let candidates = self
            .delegations
            .find_candidates(actor_id, level.approver_id, today)
            .await?;
        let mut rights = resolve(actor_id, request, level, &candidates, today);
        if rights.authorized {
            rights.delegator_name = self.directory.display_name(level.approver_id).await?;
        }
        Ok(rights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::delegation::DelegationType;
    use crate::models::request::{LeaveType, RequestPayload};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn leave_request(requester_id: Uuid) -> Request {
        Request::new(
            requester_id,
            RequestPayload::Leave {
                leave_type: LeaveType::Annual,
                start_date: date(2024, 3, 4),
                end_date: date(2024, 3, 6),
                day_count: 3.0,
                reason: None,
            },
        )
    }

    fn delegation(
        delegator_id: Uuid,
        delegate_id: Uuid,
        delegation_type: DelegationType,
    ) -> Delegation {
        Delegation::new(
            delegator_id,
            delegate_id,
            date(2024, 3, 1),
            date(2024, 3, 10),
            delegation_type,
            vec![],
            None,
        )
    }

    #[test]
    fn nominal_approver_resolves_direct() {
        let approver = Uuid::new_v4();
        let request = leave_request(Uuid::new_v4());
        let level = ApprovalLevel::new(request.id, 1, approver);

        let rights = resolve(approver, &request, &level, &[], date(2024, 3, 5));
        assert!(rights.authorized);
        assert_eq!(rights.mode, Some(ApprovalMode::Direct));
        assert!(rights.delegation_id.is_none());
    }

    #[test]
    fn unrelated_actor_is_unauthorized() {
        let request = leave_request(Uuid::new_v4());
        let level = ApprovalLevel::new(request.id, 1, Uuid::new_v4());

        let rights = resolve(Uuid::new_v4(), &request, &level, &[], date(2024, 3, 5));
        assert!(!rights.authorized);
        assert!(rights.mode.is_none());
    }

    #[test]
    fn matching_delegation_resolves_delegated_with_provenance() {
        let approver = Uuid::new_v4();
        let substitute = Uuid::new_v4();
        let request = leave_request(Uuid::new_v4());
        let level = ApprovalLevel::new(request.id, 1, approver);
        let grant = delegation(approver, substitute, DelegationType::Leave);

        let rights = resolve(
            substitute,
            &request,
            &level,
            std::slice::from_ref(&grant),
            date(2024, 3, 5),
        );
        assert!(rights.authorized);
        assert_eq!(rights.mode, Some(ApprovalMode::Delegated));
        assert_eq!(rights.delegation_id, Some(grant.id));
    }

    #[test]
    fn delegation_outside_window_does_not_authorize() {
        let approver = Uuid::new_v4();
        let substitute = Uuid::new_v4();
        let request = leave_request(Uuid::new_v4());
        let level = ApprovalLevel::new(request.id, 1, approver);
        let grant = delegation(approver, substitute, DelegationType::Leave);

        let rights = resolve(substitute, &request, &level, &[grant], date(2024, 3, 11));
        assert!(!rights.authorized);
    }

    #[test]
    fn type_mismatch_does_not_authorize() {
        let approver = Uuid::new_v4();
        let substitute = Uuid::new_v4();
        let request = leave_request(Uuid::new_v4());
        let level = ApprovalLevel::new(request.id, 1, approver);
        let grant = delegation(approver, substitute, DelegationType::Overtime);

        let rights = resolve(substitute, &request, &level, &[grant], date(2024, 3, 5));
        assert!(!rights.authorized);
    }

    #[test]
    fn excluded_requester_blocks_delegation() {
        let approver = Uuid::new_v4();
        let substitute = Uuid::new_v4();
        let requester = Uuid::new_v4();
        let request = leave_request(requester);
        let level = ApprovalLevel::new(request.id, 1, approver);
        let mut grant = delegation(approver, substitute, DelegationType::Leave);
        grant.excluded_employee_ids.0.push(requester);

        let rights = resolve(substitute, &request, &level, &[grant], date(2024, 3, 5));
        assert!(!rights.authorized);
    }

    #[test]
    fn amount_above_max_blocks_delegation() {
        let approver = Uuid::new_v4();
        let substitute = Uuid::new_v4();
        let request = leave_request(Uuid::new_v4()); // 3 days
        let level = ApprovalLevel::new(request.id, 1, approver);
        let mut grant = delegation(approver, substitute, DelegationType::Leave);
        grant.max_amount = Some(2.0);

        let rights = resolve(
            substitute,
            &request,
            &level,
            std::slice::from_ref(&grant),
            date(2024, 3, 5),
        );
        assert!(!rights.authorized);

        grant.max_amount = Some(3.0);
        let rights = resolve(substitute, &request, &level, &[grant], date(2024, 3, 5));
        assert!(rights.authorized);
    }

    #[test]
    fn specific_type_wins_over_all_on_same_date() {
        let approver = Uuid::new_v4();
        let substitute = Uuid::new_v4();
        let request = leave_request(Uuid::new_v4());
        let level = ApprovalLevel::new(request.id, 1, approver);
        let all_grant = delegation(approver, substitute, DelegationType::All);
        let leave_grant = delegation(approver, substitute, DelegationType::Leave);

        let rights = resolve(
            substitute,
            &request,
            &level,
            &[all_grant.clone(), leave_grant.clone()],
            date(2024, 3, 5),
        );
        assert_eq!(rights.delegation_id, Some(leave_grant.id));

        // Order of candidates must not matter.
        let rights = resolve(
            substitute,
            &request,
            &level,
            &[leave_grant.clone(), all_grant],
            date(2024, 3, 5),
        );
        assert_eq!(rights.delegation_id, Some(leave_grant.id));
    }

    #[test]
    fn inactive_delegation_is_ignored() {
        let approver = Uuid::new_v4();
        let substitute = Uuid::new_v4();
        let request = leave_request(Uuid::new_v4());
        let level = ApprovalLevel::new(request.id, 1, approver);
        let mut grant = delegation(approver, substitute, DelegationType::All);
        grant.is_active = false;

        let rights = resolve(substitute, &request, &level, &[grant], date(2024, 3, 5));
        assert!(!rights.authorized);
    }
}
