//! Delegation endpoints.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::models::delegation::{
    CancelDelegationBody, CreateDelegationBody, CreatedDelegation, Delegation, DelegationScope,
    DelegationStatus, DelegationView, UpdateDelegationBody,
};
use crate::models::{PaginatedResponse, PaginationQuery};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct DelegationListQuery {
    #[serde(default)]
    pub scope: DelegationScope,
    #[serde(default)]
    pub status: Option<DelegationStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub async fn create_delegation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateDelegationBody>,
) -> Result<(StatusCode, Json<CreatedDelegation>), AppError> {
    let created = state
        .delegations
        .create_delegation(auth.employee_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_delegations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<DelegationListQuery>,
) -> Result<Json<PaginatedResponse<DelegationView>>, AppError> {
    let page = PaginationQuery {
        limit: query.limit,
        offset: query.offset,
    };
    let views = state
        .delegations
        .list_delegations(
            query.scope,
            auth.employee_id,
            auth.is_admin,
            query.status,
            page.limit(),
            page.offset(),
        )
        .await?;
    Ok(Json(PaginatedResponse::new(views, page.limit(), page.offset())))
}

pub async fn update_delegation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateDelegationBody>,
) -> Result<Json<Delegation>, AppError> {
    let updated = state
        .delegations
        .update_delegation(id, auth.employee_id, auth.is_admin, body)
        .await?;
    Ok(Json(updated))
}

pub async fn cancel_delegation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<CancelDelegationBody>,
) -> Result<Json<Delegation>, AppError> {
    let cancelled = state
        .delegations
        .cancel_delegation(id, auth.employee_id, auth.is_admin, &body.reason)
        .await?;
    Ok(Json(cancelled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_to_mine_scope() {
        let query: DelegationListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.scope, DelegationScope::Mine);
        assert_eq!(query.limit, 50);
    }

    #[test]
    fn scope_parses_from_snake_case() {
        let query: DelegationListQuery =
            serde_json::from_str("{\"scope\": \"received\"}").unwrap();
        assert_eq!(query.scope, DelegationScope::Received);
    }
}
