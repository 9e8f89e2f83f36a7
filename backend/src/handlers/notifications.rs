//! Delegation notification read model: list my notifications, mark one read.

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::models::notification::DelegationNotification;
use crate::models::{PaginatedResponse, PaginationQuery};
use crate::repositories::notification::{list_for_recipient, mark_read};
use crate::state::AppState;

pub async fn list_my_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<DelegationNotification>>, AppError> {
    let rows = list_for_recipient(&state.pool, auth.employee_id, page.limit(), page.offset())
        .await?;
    Ok(Json(PaginatedResponse::new(rows, page.limit(), page.offset())))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let affected = mark_read(&state.pool, id, auth.employee_id, Utc::now()).await?;
    if affected == 0 {
        return Err(AppError::NotFound(
            "Notification not found or already read".to_string(),
        ));
    }
    Ok(Json(json!({ "id": id, "read": true })))
}
