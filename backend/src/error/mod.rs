use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Application error taxonomy. Workflow outcomes (conflicts, lost races,
/// invalid transitions) are expected results returned to the caller, not
/// faults; only `InternalServerError` is logged as an error.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    /// Carries the colliding entity's identity so the caller can resolve it.
    Conflict {
        message: String,
        details: Option<Value>,
    },
    /// Transition attempted from a terminal or incompatible state.
    InvalidState(String),
    /// A concurrent actor already acted on this level; the caller must
    /// re-fetch current state before retrying.
    AlreadyProcessed(String),
    /// Delegation was already deactivated.
    AlreadyCancelled(String),
    BadRequest(String),
    InternalServerError(anyhow::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::InvalidState(msg)
            | AppError::AlreadyProcessed(msg)
            | AppError::AlreadyCancelled(msg)
            | AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::Conflict { message, .. } => write!(f, "{}", message),
            AppError::InternalServerError(err) => write!(f, "{}", err),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join(", ")),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        AppError::Conflict {
            message: message.into(),
            details: Some(details),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND".to_string(), None),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                msg,
                "UNAUTHORIZED".to_string(),
                None,
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN".to_string(), None),
            AppError::Conflict { message, details } => (
                StatusCode::CONFLICT,
                message,
                "CONFLICT".to_string(),
                details,
            ),
            AppError::InvalidState(msg) => {
                (StatusCode::CONFLICT, msg, "INVALID_STATE".to_string(), None)
            }
            AppError::AlreadyProcessed(msg) => (
                StatusCode::CONFLICT,
                msg,
                "ALREADY_PROCESSED".to_string(),
                Some(serde_json::json!({ "retry": true })),
            ),
            AppError::AlreadyCancelled(msg) => (
                StatusCode::CONFLICT,
                msg,
                "ALREADY_CANCELLED".to_string(),
                None,
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                msg,
                "BAD_REQUEST".to_string(),
                None,
            ),
            AppError::InternalServerError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_SERVER_ERROR".to_string(),
                    None,
                )
            }
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                "VALIDATION_ERROR".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::InternalServerError(err.into()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let code = e.code.as_ref();
                    format!("{}: {}", field, code)
                })
            })
            .collect();
        AppError::Validation(messages)
    }
}
