//! Request endpoints: creation, listing, and the approval lifecycle.
//!
//! Handlers stay thin: identity comes from the auth middleware, the workflow
//! engine owns every rule. The split between `/me` and `/pending` mirrors the
//! two sides of the workflow: what I asked for, and what waits on me.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::models::request::{
    CancelRequestBody, DecisionBody, Request, RequestDecision, RequestPayload, RequestStatus,
    RequestType, RequestWithLevels,
};
use crate::models::PaginatedResponse;
use crate::repositories::RequestListFilters;
use crate::services::resolver::ApprovalRights;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct RequestListQuery {
    #[serde(default)]
    pub status: Option<RequestStatus>,
    #[serde(default)]
    pub request_type: Option<RequestType>,
    /// Admin listing only; ignored on the self-scoped routes.
    #[serde(default)]
    pub requester_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl RequestListQuery {
    fn limit(&self) -> i64 {
        self.limit.clamp(1, 500)
    }

    fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

pub async fn create_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<RequestPayload>,
) -> Result<(StatusCode, Json<RequestWithLevels>), AppError> {
    let created = state
        .workflow
        .create_request(auth.employee_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Requests the caller submitted.
pub async fn list_my_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<PaginatedResponse<Request>>, AppError> {
    let filters = RequestListFilters {
        status: query.status,
        requester_id: Some(auth.employee_id),
        request_type: query.request_type,
        awaiting_approver: None,
    };
    let rows = state
        .workflow
        .list_requests(&filters, query.limit(), query.offset())
        .await?;
    Ok(Json(PaginatedResponse::new(
        rows,
        query.limit(),
        query.offset(),
    )))
}

/// Requests whose current level is waiting on the caller.
pub async fn list_pending_approvals(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<PaginatedResponse<Request>>, AppError> {
    let filters = RequestListFilters {
        status: None,
        requester_id: None,
        request_type: query.request_type,
        awaiting_approver: Some(auth.employee_id),
    };
    let rows = state
        .workflow
        .list_requests(&filters, query.limit(), query.offset())
        .await?;
    Ok(Json(PaginatedResponse::new(
        rows,
        query.limit(),
        query.offset(),
    )))
}

/// Administrative listing across all employees.
pub async fn list_all_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<PaginatedResponse<Request>>, AppError> {
    let filters = RequestListFilters {
        status: query.status,
        requester_id: query.requester_id,
        request_type: query.request_type,
        awaiting_approver: None,
    };
    let rows = state
        .workflow
        .list_requests(&filters, query.limit(), query.offset())
        .await?;
    Ok(Json(PaginatedResponse::new(
        rows,
        query.limit(),
        query.offset(),
    )))
}

pub async fn get_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<RequestWithLevels>, AppError> {
    let found = state.workflow.get_request(id).await?;
    let involved = found.request.requester_id == auth.employee_id
        || found.levels.iter().any(|level| {
            level.approver_id == auth.employee_id || level.acted_by_id == Some(auth.employee_id)
        });
    if !involved && !auth.is_admin {
        return Err(AppError::Forbidden(
            "not a participant in this request".to_string(),
        ));
    }
    Ok(Json(found))
}

/// Whether the caller may decide the request's current level, and under which
/// capacity. Read-only.
pub async fn get_approval_rights(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApprovalRights>, AppError> {
    let rights = state.workflow.resolve_rights(auth.employee_id, id).await?;
    Ok(Json(rights))
}

pub async fn approve_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<Json<RequestDecision>, AppError> {
    let decision = state
        .workflow
        .approve(id, auth.employee_id, body.comment)
        .await?;
    Ok(Json(decision))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<Json<RequestDecision>, AppError> {
    let decision = state
        .workflow
        .reject(id, auth.employee_id, body.comment)
        .await?;
    Ok(Json(decision))
}

/// Administrative cancellation of an already approved request.
pub async fn cancel_approved_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<CancelRequestBody>,
) -> Result<Json<RequestWithLevels>, AppError> {
    let cancelled = state
        .workflow
        .cancel_approved(id, auth.employee_id, auth.is_admin, &body.reason)
        .await?;
    Ok(Json(cancelled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_and_clamping() {
        let query: RequestListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit(), 50);
        assert_eq!(query.offset(), 0);
        assert!(query.status.is_none());

        let query = RequestListQuery {
            status: Some(RequestStatus::Pending),
            request_type: None,
            requester_id: None,
            limit: 9999,
            offset: -1,
        };
        assert_eq!(query.limit(), 500);
        assert_eq!(query.offset(), 0);
    }
}
