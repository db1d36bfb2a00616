use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vibe_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `vibe_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(core) => match core {
                CoreError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                CoreError::LocationRequired => (StatusCode::BAD_REQUEST, "LOCATION_REQUIRED"),
                CoreError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::TooFar { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "TOO_FAR"),
                CoreError::AlreadyFull => (StatusCode::CONFLICT, "ALREADY_FULL"),
                CoreError::SelfJoinForbidden => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "SELF_JOIN_FORBIDDEN")
                }
                CoreError::ProfileNotFound => (StatusCode::NOT_FOUND, "PROFILE_NOT_FOUND"),
                CoreError::NotParticipant => (StatusCode::FORBIDDEN, "NOT_PARTICIPANT"),
                CoreError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
                CoreError::GhostReportNotAllowed(_) => {
                    (StatusCode::CONFLICT, "GHOST_REPORT_NOT_ALLOWED")
                }
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CoreError::ActionFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ACTION_FAILED"),
            },
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Core(CoreError::ActionFailed(detail)) => {
                tracing::error!(error = %detail, "Action failed");
                "An internal error occurred".to_string()
            }
            AppError::Core(core) => core.to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Unauthorized(msg) => (*msg).to_string(),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
