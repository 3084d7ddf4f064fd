use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::delivery::DeliveryError;
use crate::diagnostics::UnclassifiedOutcome;
use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Secret lookup failed: {0}")]
    Secrets(#[from] SecretError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Unclassified send outcome: {0}")]
    Unclassified(#[from] UnclassifiedOutcome),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

fn internal(
    code: &'static str,
    public: &str,
    log_msg: String,
) -> (StatusCode, &'static str, String, String) {
    let client_msg = if is_production() {
        public.to_string()
    } else {
        log_msg.clone()
    };
    (StatusCode::INTERNAL_SERVER_ERROR, code, client_msg, log_msg)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, client_message, log_message) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                msg.clone(),
            ),
            AppError::Secrets(e) => {
                internal("SECRETS_ERROR", "Service temporarily unavailable", e.to_string())
            }
            AppError::Delivery(e) => {
                internal("DELIVERY_ERROR", "Service temporarily unavailable", e.to_string())
            }
            AppError::Unclassified(e) => internal(
                "INTERNAL_ERROR",
                "Internal server error",
                format!("{}: {:?}", e, e.outcome),
            ),
        };

        // Always log the detailed error server-side
        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "API error"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{ChannelFailure, SendOutcome};

    #[test]
    fn test_unclassified_is_internal_error() {
        let err = AppError::from(UnclassifiedOutcome {
            outcome: SendOutcome::Failure(ChannelFailure::MobilePush {
                message: "unregistered".to_string(),
            }),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_delivery_errors_are_internal() {
        let err = AppError::from(DeliveryError::TemplateNotFound("tpl-1".to_string()));
        assert!(matches!(err, AppError::Delivery(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::from(DeliveryError::Unavailable("timeout".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let response = AppError::Validation("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
