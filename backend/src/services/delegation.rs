//! Delegation lifecycle: create, adjust, cancel, list.
//!
//! The resolution side (who may approve what today) lives in the resolver;
//! this service owns the grant records themselves and the courtesy
//! notifications around them. Notifications are best-effort: a grant that
//! failed to announce itself is still a valid grant.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::delegation::{
    CreateDelegationBody, CreatedDelegation, Delegation, DelegationScope, DelegationStatus,
    DelegationView, UpdateDelegationBody,
};
use crate::models::notification::NotificationType;
use crate::repositories::DelegationStore;
use crate::services::directory::EmployeeDirectory;
use crate::services::notifier::NotificationSink;
use crate::utils::time::today_local;
use crate::validation::rules::validate_reason;

#[derive(Clone)]
pub struct DelegationService {
    delegations: Arc<dyn DelegationStore>,
    directory: Arc<dyn EmployeeDirectory>,
    sink: Arc<dyn NotificationSink>,
    time_zone: Tz,
}

impl DelegationService {
    pub fn new(
        delegations: Arc<dyn DelegationStore>,
        directory: Arc<dyn EmployeeDirectory>,
        sink: Arc<dyn NotificationSink>,
        time_zone: Tz,
    ) -> Self {
        Self {
            delegations,
            directory,
            sink,
            time_zone,
        }
    }

    fn today(&self) -> NaiveDate {
        today_local(&self.time_zone)
    }

    /// Create a grant after checking self-delegation, window sanity, and
    /// same-type overlap. A delegate who reports (directly or transitively) to
    /// the delegator gets the grant anyway, flagged with a warning.
    pub async fn create_delegation(
        &self,
        delegator_id: Uuid,
        body: CreateDelegationBody,
    ) -> Result<CreatedDelegation, AppError> {
        let mut errors = Vec::new();
        if body.delegate_id == delegator_id {
            errors.push("delegate_id: self_delegation".to_string());
        }
        if body.start_date > body.end_date {
            errors.push("start_date: date_window_inverted".to_string());
        }
        if body.end_date < self.today() {
            errors.push("end_date: window_already_past".to_string());
        }
        if let Some(max) = body.max_amount {
            if !max.is_finite() || max <= 0.0 {
                errors.push("max_amount: not_positive".to_string());
            }
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        if let Some(existing) = self
            .delegations
            .find_active_overlapping(
                delegator_id,
                body.delegation_type,
                body.start_date,
                body.end_date,
                None,
            )
            .await?
        {
            return Err(AppError::conflict(
                "an active delegation of the same type overlaps the requested window",
                json!({
                    "delegation_id": existing.id,
                    "delegate_id": existing.delegate_id,
                    "delegation_type": existing.delegation_type,
                    "start_date": existing.start_date,
                    "end_date": existing.end_date,
                }),
            ));
        }

        let chain = self.directory.manager_chain_of(body.delegate_id).await?;
        let subordinate_warning = chain.contains(&delegator_id);

        let delegation = Delegation::new(
            delegator_id,
            body.delegate_id,
            body.start_date,
            body.end_date,
            body.delegation_type,
            body.excluded_employee_ids,
            body.max_amount,
        );
        self.delegations.insert(&delegation).await?;

        let (delegate_notified, team_notified) = self.announce_creation(&delegation).await;
        if delegate_notified || team_notified {
            if let Err(err) = self
                .delegations
                .set_notification_flags(delegation.id, delegate_notified, team_notified)
                .await
            {
                tracing::warn!(
                    delegation_id = %delegation.id,
                    error = ?err,
                    "failed to record notification flags"
                );
            }
        }

        Ok(CreatedDelegation {
            delegation,
            subordinate_warning,
        })
    }

    /// Cancel a grant. Only the delegator or an administrator may cancel; a
    /// grant that is already cancelled stays cancelled.
    pub async fn cancel_delegation(
        &self,
        id: Uuid,
        actor_id: Uuid,
        is_admin: bool,
        reason: &str,
    ) -> Result<Delegation, AppError> {
        if validate_reason(reason).is_err() {
            return Err(AppError::Validation(vec![
                "reason: reason_required".to_string()
            ]));
        }

        let delegation = self.load(id).await?;
        if delegation.delegator_id != actor_id && !is_admin {
            return Err(AppError::Forbidden(
                "only the delegator or an administrator can cancel a delegation".to_string(),
            ));
        }
        if !delegation.is_active {
            return Err(AppError::AlreadyCancelled(
                "delegation is already cancelled".to_string(),
            ));
        }

        let affected = self
            .delegations
            .deactivate(id, actor_id, reason, Utc::now())
            .await?;
        if affected == 0 {
            return Err(AppError::AlreadyCancelled(
                "delegation is already cancelled".to_string(),
            ));
        }

        if let Err(err) = self
            .sink
            .enqueue(
                delegation.id,
                delegation.delegate_id,
                NotificationType::DelegationCancelled,
                "A delegation granted to you has been cancelled".to_string(),
            )
            .await
        {
            tracing::warn!(delegation_id = %delegation.id, error = %err, "cancellation notice failed");
        }

        self.load(id).await
    }

    /// Adjust the end date, exclusion list, or amount bound of a grant that is
    /// still active and not yet expired.
    pub async fn update_delegation(
        &self,
        id: Uuid,
        actor_id: Uuid,
        is_admin: bool,
        body: UpdateDelegationBody,
    ) -> Result<Delegation, AppError> {
        let mut delegation = self.load(id).await?;
        if delegation.delegator_id != actor_id && !is_admin {
            return Err(AppError::Forbidden(
                "only the delegator or an administrator can update a delegation".to_string(),
            ));
        }
        if !delegation.is_active {
            return Err(AppError::AlreadyCancelled(
                "delegation is already cancelled".to_string(),
            ));
        }
        let today = self.today();
        if delegation.end_date < today {
            return Err(AppError::InvalidState(
                "an expired delegation can no longer be updated".to_string(),
            ));
        }

        if let Some(new_end) = body.end_date {
            if new_end < delegation.start_date {
                return Err(AppError::Validation(vec![
                    "end_date: date_window_inverted".to_string(),
                ]));
            }
            if let Some(existing) = self
                .delegations
                .find_active_overlapping(
                    delegation.delegator_id,
                    delegation.delegation_type,
                    delegation.start_date,
                    new_end,
                    Some(delegation.id),
                )
                .await?
            {
                return Err(AppError::conflict(
                    "the extended window overlaps another active delegation of the same type",
                    json!({
                        "delegation_id": existing.id,
                        "delegate_id": existing.delegate_id,
                        "start_date": existing.start_date,
                        "end_date": existing.end_date,
                    }),
                ));
            }
            delegation.end_date = new_end;
        }
        if let Some(excluded) = body.excluded_employee_ids {
            delegation.excluded_employee_ids = sqlx::types::Json(excluded);
        }
        if let Some(max) = body.max_amount {
            if !max.is_finite() || max <= 0.0 {
                return Err(AppError::Validation(vec![
                    "max_amount: not_positive".to_string(),
                ]));
            }
            delegation.max_amount = Some(max);
        }
        delegation.updated_at = Utc::now();

        let affected = self.delegations.update_constraints(&delegation).await?;
        if affected == 0 {
            return Err(AppError::AlreadyCancelled(
                "delegation was cancelled concurrently".to_string(),
            ));
        }
        Ok(delegation)
    }

    /// List grants for the caller's chosen scope, each with its derived
    /// status, optionally narrowed to one status. The `all` scope is
    /// administrative.
    pub async fn list_delegations(
        &self,
        scope: DelegationScope,
        caller_id: Uuid,
        is_admin: bool,
        status: Option<DelegationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DelegationView>, AppError> {
        let rows = match scope {
            DelegationScope::Mine => {
                self.delegations
                    .list_for_delegator(caller_id, limit, offset)
                    .await?
            }
            DelegationScope::Received => {
                self.delegations
                    .list_for_delegate(caller_id, limit, offset)
                    .await?
            }
            DelegationScope::All => {
                if !is_admin {
                    return Err(AppError::Forbidden(
                        "listing all delegations requires an administrative capability"
                            .to_string(),
                    ));
                }
                self.delegations.list_all(limit, offset).await?
            }
        };
        let today = self.today();
        Ok(rows
            .into_iter()
            .map(|delegation| {
                let status = delegation.status_on(today);
                DelegationView { delegation, status }
            })
            .filter(|view| status.is_none_or(|wanted| view.status == wanted))
            .collect())
    }

    async fn load(&self, id: Uuid) -> Result<Delegation, AppError> {
        self.delegations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Delegation not found".to_string()))
    }

    /// Announce a fresh grant to the delegate and to the delegator's direct
    /// reports. Returns which of the two announcements went through.
    async fn announce_creation(&self, delegation: &Delegation) -> (bool, bool) {
        let delegator_name = match self.directory.display_name(delegation.delegator_id).await {
            Ok(Some(name)) => name,
            Ok(None) => "your manager".to_string(),
            Err(err) => {
                tracing::warn!(delegation_id = %delegation.id, error = ?err, "directory lookup failed");
                "your manager".to_string()
            }
        };

        let delegate_notified = match self
            .sink
            .enqueue(
                delegation.id,
                delegation.delegate_id,
                NotificationType::DelegateAssigned,
                format!(
                    "{} delegated {} approvals to you from {} to {}",
                    delegator_name,
                    delegation.delegation_type.db_value(),
                    delegation.start_date,
                    delegation.end_date
                ),
            )
            .await
        {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(delegation_id = %delegation.id, error = %err, "delegate notice failed");
                false
            }
        };

        let team_notified = match self.announce_to_team(delegation, &delegator_name).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(delegation_id = %delegation.id, error = %err, "team notice failed");
                false
            }
        };

        (delegate_notified, team_notified)
    }

    async fn announce_to_team(
        &self,
        delegation: &Delegation,
        delegator_name: &str,
    ) -> Result<(), AppError> {
        let reports = self
            .directory
            .direct_reports_of(delegation.delegator_id)
            .await?;
        for report_id in reports {
            if report_id == delegation.delegate_id {
                continue;
            }
            self.sink
                .enqueue(
                    delegation.id,
                    report_id,
                    NotificationType::TeamInformed,
                    format!(
                        "{} approvals for {} are handled by a substitute from {} to {}",
                        delegation.delegation_type.db_value(),
                        delegator_name,
                        delegation.start_date,
                        delegation.end_date
                    ),
                )
                .await
                .map_err(|e| AppError::InternalServerError(anyhow::anyhow!(e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::delegation::DelegationType;
    use crate::repositories::MockDelegationStore;
    use crate::services::directory::MockEmployeeDirectory;
    use crate::services::notifier::{MockNotificationSink, SinkError};
    use chrono::Duration;
    use mockall::predicate::eq;

    fn service(
        delegations: MockDelegationStore,
        directory: MockEmployeeDirectory,
        sink: MockNotificationSink,
    ) -> DelegationService {
        DelegationService::new(
            Arc::new(delegations),
            Arc::new(directory),
            Arc::new(sink),
            chrono_tz::UTC,
        )
    }

    fn window() -> (NaiveDate, NaiveDate) {
        let today = Utc::now().date_naive();
        (today + Duration::days(1), today + Duration::days(14))
    }

    fn create_body(delegate_id: Uuid) -> CreateDelegationBody {
        let (start, end) = window();
        CreateDelegationBody {
            delegate_id,
            start_date: start,
            end_date: end,
            delegation_type: DelegationType::Leave,
            excluded_employee_ids: vec![],
            max_amount: None,
        }
    }

    fn grant(delegator: Uuid, delegate: Uuid) -> Delegation {
        let (start, end) = window();
        Delegation::new(delegator, delegate, start, end, DelegationType::Leave, vec![], None)
    }

    #[tokio::test]
    async fn create_inserts_and_notifies() {
        let delegator = Uuid::new_v4();
        let delegate = Uuid::new_v4();
        let peer = Uuid::new_v4();

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_find_active_overlapping()
            .returning(|_, _, _, _, _| Ok(None));
        delegations
            .expect_insert()
            .withf(move |d| d.delegator_id == delegator && d.delegate_id == delegate)
            .returning(|_| Ok(()));
        delegations
            .expect_set_notification_flags()
            .withf(|_, delegate_notified, team_notified| *delegate_notified && *team_notified)
            .returning(|_, _, _| Ok(()));

        let mut directory = MockEmployeeDirectory::new();
        directory
            .expect_manager_chain_of()
            .with(eq(delegate))
            .returning(|_| Ok(vec![]));
        directory
            .expect_display_name()
            .returning(|_| Ok(Some("Dana".to_string())));
        directory
            .expect_direct_reports_of()
            .returning(move |_| Ok(vec![delegate, peer]));

        let mut sink = MockNotificationSink::new();
        sink.expect_enqueue()
            .withf(move |_, recipient, kind, _| {
                *recipient == delegate && *kind == NotificationType::DelegateAssigned
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        // The delegate is filtered out of the team announcement.
        sink.expect_enqueue()
            .withf(move |_, recipient, kind, _| {
                *recipient == peer && *kind == NotificationType::TeamInformed
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let service = service(delegations, directory, sink);
        let created = service
            .create_delegation(delegator, create_body(delegate))
            .await
            .unwrap();
        assert!(!created.subordinate_warning);
        assert!(created.delegation.is_active);
    }

    #[tokio::test]
    async fn create_rejects_self_delegation() {
        let delegator = Uuid::new_v4();
        let service = service(
            MockDelegationStore::new(),
            MockEmployeeDirectory::new(),
            MockNotificationSink::new(),
        );
        let err = service
            .create_delegation(delegator, create_body(delegator))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(messages) => {
                assert!(messages.iter().any(|m| m.contains("self_delegation")));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_rejects_inverted_and_past_windows() {
        let service = service(
            MockDelegationStore::new(),
            MockEmployeeDirectory::new(),
            MockNotificationSink::new(),
        );

        let mut body = create_body(Uuid::new_v4());
        std::mem::swap(&mut body.start_date, &mut body.end_date);
        let err = service
            .create_delegation(Uuid::new_v4(), body)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let today = Utc::now().date_naive();
        let mut body = create_body(Uuid::new_v4());
        body.start_date = today - Duration::days(10);
        body.end_date = today - Duration::days(3);
        let err = service
            .create_delegation(Uuid::new_v4(), body)
            .await
            .unwrap_err();
        match err {
            AppError::Validation(messages) => {
                assert!(messages.iter().any(|m| m.contains("window_already_past")));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_conflicts_with_same_type_overlap() {
        let delegator = Uuid::new_v4();
        let existing = grant(delegator, Uuid::new_v4());
        let existing_id = existing.id;

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_find_active_overlapping()
            .returning(move |_, _, _, _, _| Ok(Some(existing.clone())));

        let service = service(
            delegations,
            MockEmployeeDirectory::new(),
            MockNotificationSink::new(),
        );
        let err = service
            .create_delegation(delegator, create_body(Uuid::new_v4()))
            .await
            .unwrap_err();
        match err {
            AppError::Conflict { details, .. } => {
                let details = details.unwrap();
                assert_eq!(details["delegation_id"], serde_json::json!(existing_id));
            }
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_flags_subordinate_delegate() {
        let delegator = Uuid::new_v4();
        let delegate = Uuid::new_v4();

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_find_active_overlapping()
            .returning(|_, _, _, _, _| Ok(None));
        delegations.expect_insert().returning(|_| Ok(()));
        delegations
            .expect_set_notification_flags()
            .returning(|_, _, _| Ok(()));

        let mut directory = MockEmployeeDirectory::new();
        directory
            .expect_manager_chain_of()
            .returning(move |_| Ok(vec![delegator, Uuid::new_v4()]));
        directory
            .expect_display_name()
            .returning(|_| Ok(Some("Dana".to_string())));
        directory.expect_direct_reports_of().returning(|_| Ok(vec![]));

        let mut sink = MockNotificationSink::new();
        sink.expect_enqueue().returning(|_, _, _, _| Ok(()));

        let service = service(delegations, directory, sink);
        let created = service
            .create_delegation(delegator, create_body(delegate))
            .await
            .unwrap();
        assert!(created.subordinate_warning);
    }

    #[tokio::test]
    async fn create_succeeds_when_notifications_fail() {
        let delegator = Uuid::new_v4();

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_find_active_overlapping()
            .returning(|_, _, _, _, _| Ok(None));
        delegations.expect_insert().returning(|_| Ok(()));
        // Both announcements failed, so the flag write is skipped entirely.
        delegations.expect_set_notification_flags().times(0);

        let mut directory = MockEmployeeDirectory::new();
        directory.expect_manager_chain_of().returning(|_| Ok(vec![]));
        directory
            .expect_display_name()
            .returning(|_| Ok(Some("Dana".to_string())));
        directory
            .expect_direct_reports_of()
            .returning(|_| Ok(vec![Uuid::new_v4()]));

        let mut sink = MockNotificationSink::new();
        sink.expect_enqueue()
            .returning(|_, _, _, _| Err(SinkError::Unavailable("queue down".to_string())));

        let service = service(delegations, directory, sink);
        let created = service
            .create_delegation(delegator, create_body(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(created.delegation.is_active);
    }

    #[tokio::test]
    async fn cancel_requires_delegator_or_admin() {
        let delegation = grant(Uuid::new_v4(), Uuid::new_v4());
        let id = delegation.id;

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_find_by_id()
            .returning(move |_| Ok(Some(delegation.clone())));

        let service = service(
            delegations,
            MockEmployeeDirectory::new(),
            MockNotificationSink::new(),
        );
        let err = service
            .cancel_delegation(id, Uuid::new_v4(), false, "no longer needed")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn cancel_twice_reports_already_cancelled() {
        let delegator = Uuid::new_v4();
        let mut delegation = grant(delegator, Uuid::new_v4());
        delegation.is_active = false;
        let id = delegation.id;

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_find_by_id()
            .returning(move |_| Ok(Some(delegation.clone())));

        let service = service(
            delegations,
            MockEmployeeDirectory::new(),
            MockNotificationSink::new(),
        );
        let err = service
            .cancel_delegation(id, delegator, false, "no longer needed")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyCancelled(_)));
    }

    #[tokio::test]
    async fn cancel_notifies_the_delegate() {
        let delegator = Uuid::new_v4();
        let delegate = Uuid::new_v4();
        let delegation = grant(delegator, delegate);
        let id = delegation.id;

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_find_by_id()
            .returning(move |_| Ok(Some(delegation.clone())));
        delegations
            .expect_deactivate()
            .withf(move |got_id, actor, reason, _| {
                *got_id == id && *actor == delegator && reason == "no longer needed"
            })
            .returning(|_, _, _, _| Ok(1));

        let mut sink = MockNotificationSink::new();
        sink.expect_enqueue()
            .withf(move |_, recipient, kind, _| {
                *recipient == delegate && *kind == NotificationType::DelegationCancelled
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let service = service(delegations, MockEmployeeDirectory::new(), sink);
        let result = service
            .cancel_delegation(id, delegator, false, "no longer needed")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn update_rejects_expired_delegation() {
        let delegator = Uuid::new_v4();
        let today = Utc::now().date_naive();
        let mut delegation = grant(delegator, Uuid::new_v4());
        delegation.start_date = today - Duration::days(20);
        delegation.end_date = today - Duration::days(10);
        let id = delegation.id;

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_find_by_id()
            .returning(move |_| Ok(Some(delegation.clone())));

        let service = service(
            delegations,
            MockEmployeeDirectory::new(),
            MockNotificationSink::new(),
        );
        let err = service
            .update_delegation(id, delegator, false, UpdateDelegationBody::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn update_extension_rechecks_overlap_excluding_itself() {
        let delegator = Uuid::new_v4();
        let delegation = grant(delegator, Uuid::new_v4());
        let id = delegation.id;
        let new_end = delegation.end_date + Duration::days(7);

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_find_by_id()
            .returning(move |_| Ok(Some(delegation.clone())));
        delegations
            .expect_find_active_overlapping()
            .withf(move |_, _, _, end, exclude| *end == new_end && *exclude == Some(id))
            .returning(|_, _, _, _, _| Ok(None));
        delegations
            .expect_update_constraints()
            .withf(move |d| d.end_date == new_end)
            .returning(|_| Ok(1));

        let service = service(
            delegations,
            MockEmployeeDirectory::new(),
            MockNotificationSink::new(),
        );
        let updated = service
            .update_delegation(
                id,
                delegator,
                false,
                UpdateDelegationBody {
                    end_date: Some(new_end),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.end_date, new_end);
    }

    #[tokio::test]
    async fn list_all_scope_is_admin_only() {
        let service = service(
            MockDelegationStore::new(),
            MockEmployeeDirectory::new(),
            MockNotificationSink::new(),
        );
        let err = service
            .list_delegations(DelegationScope::All, Uuid::new_v4(), false, None, 50, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn list_derives_status_per_row() {
        let caller = Uuid::new_v4();
        let today = Utc::now().date_naive();
        let mut active = grant(caller, Uuid::new_v4());
        active.start_date = today - Duration::days(1);
        active.end_date = today + Duration::days(1);
        let mut expired = grant(caller, Uuid::new_v4());
        expired.start_date = today - Duration::days(20);
        expired.end_date = today - Duration::days(10);

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_list_for_delegator()
            .with(eq(caller), eq(50), eq(0))
            .returning(move |_, _, _| Ok(vec![active.clone(), expired.clone()]));

        let service = service(
            delegations,
            MockEmployeeDirectory::new(),
            MockNotificationSink::new(),
        );
        let views = service
            .list_delegations(DelegationScope::Mine, caller, false, None, 50, 0)
            .await
            .unwrap();
        assert_eq!(views[0].status, DelegationStatus::Active);
        assert_eq!(views[1].status, DelegationStatus::Expired);
    }

    #[tokio::test]
    async fn list_status_filter_narrows_results() {
        let caller = Uuid::new_v4();
        let today = Utc::now().date_naive();
        let mut active = grant(caller, Uuid::new_v4());
        active.start_date = today - Duration::days(1);
        active.end_date = today + Duration::days(1);
        let mut expired = grant(caller, Uuid::new_v4());
        expired.start_date = today - Duration::days(20);
        expired.end_date = today - Duration::days(10);

        let mut delegations = MockDelegationStore::new();
        delegations
            .expect_list_for_delegator()
            .returning(move |_, _, _| Ok(vec![active.clone(), expired.clone()]));

        let service = service(
            delegations,
            MockEmployeeDirectory::new(),
            MockNotificationSink::new(),
        );
        let views = service
            .list_delegations(
                DelegationScope::Mine,
                caller,
                false,
                Some(DelegationStatus::Expired),
                50,
                0,
            )
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, DelegationStatus::Expired);
    }
}
