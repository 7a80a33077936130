use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pagination::ReflowError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Reflow error: {0}")]
    Reflow(#[from] ReflowError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Reflow(e @ ReflowError::OracleUnavailable { .. }) => {
                tracing::warn!("Reflow error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "RENDER_TARGET_UNAVAILABLE",
                    e.to_string(),
                )
            }
            AppError::Reflow(e @ ReflowError::IndexOutOfRange { .. }) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
            }
            AppError::Reflow(e) => {
                tracing::warn!("Reflow error: {e}");
                (StatusCode::CONFLICT, "REFLOW_ABORTED", e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

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
    use std::time::Duration;

    use crate::pagination::{PageId, ReflowReport};

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::Reflow(ReflowError::OracleUnavailable {
                    page: PageId::from(2),
                    waited: Duration::from_millis(10),
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Reflow(ReflowError::IndexOutOfRange { index: 4, len: 1 }),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Reflow(ReflowError::NoSplitProgress {
                    page: PageId::from(1),
                    partial: ReflowReport::default(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_internal_error_message_is_not_leaked() {
        let (_, code, message) = AppError::Internal(anyhow::anyhow!("secret detail")).parts();
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("secret"));
    }
}
