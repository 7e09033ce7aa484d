use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::interview::controller::TurnError;
use crate::interview::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Session already complete: {0}")]
    SessionCompleted(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::SessionNotFound(_) => AppError::NotFound(e.to_string()),
            TurnError::SessionCompleted(_) => AppError::SessionCompleted(e.to_string()),
            TurnError::RevisionConflict(_) => AppError::Conflict(e.to_string()),
            TurnError::Store(inner) => AppError::Store(inner),
            TurnError::NoStage(_) | TurnError::StageMismatch { .. } => {
                AppError::Internal(anyhow::Error::new(e))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::SessionCompleted(msg) => {
                (StatusCode::CONFLICT, "SESSION_COMPLETED", msg.clone())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A session storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::session::Control;
    use uuid::Uuid;

    fn status_of(e: TurnError) -> StatusCode {
        AppError::from(e).into_response().status()
    }

    #[test]
    fn test_turn_errors_map_to_http_status() {
        let id = Uuid::nil();
        assert_eq!(status_of(TurnError::SessionNotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(TurnError::SessionCompleted(id)), StatusCode::CONFLICT);
        assert_eq!(status_of(TurnError::RevisionConflict(id)), StatusCode::CONFLICT);
        assert_eq!(
            status_of(TurnError::NoStage(Control::Evaluating)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_is_bad_request() {
        let response = AppError::Validation("empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
