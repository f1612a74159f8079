use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use instapp_core::{AddressError, ValidationError};
use serde_json::json;
use thiserror::Error;

use crate::retry::RetryError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote store unreachable or credential rejected
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    #[error("Failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Worth another attempt under the retry policy
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::TransientNetwork(_))
    }
}

impl From<RetryError<AppError>> for AppError {
    fn from(err: RetryError<AppError>) -> Self {
        match err {
            RetryError::Permanent(e) => e,
            RetryError::Exhausted { attempts, last } => AppError::RetriesExhausted {
                attempts,
                message: last.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Internal(format!("unexpected response body: {err}"))
        } else {
            AppError::TransientNetwork(err.to_string())
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Validation(ValidationError::Other(format!("invalid CSV: {err}")))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = match &self {
            AppError::Configuration(_) => {
                tracing::error!("Configuration error: {}", message);
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Connection(_) => StatusCode::BAD_GATEWAY,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TransientNetwork(_) | AppError::RetriesExhausted { .. } => {
                tracing::warn!("Remote call failed: {}", message);
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Address(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                StatusCode::BAD_REQUEST
            }
            AppError::Internal(_) => {
                tracing::error!("Internal error: {}", message);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response();
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_errors_retry() {
        assert!(AppError::TransientNetwork("reset".into()).is_transient());
        assert!(!AppError::PermissionDenied("x".into()).is_transient());
        assert!(!AppError::NotFound("x".into()).is_transient());
        assert!(!AppError::Connection("x".into()).is_transient());
    }

    #[test]
    fn test_retry_error_conversion() {
        let err: AppError = RetryError::Exhausted {
            attempts: 3,
            last: AppError::TransientNetwork("timed out".into()),
        }
        .into();
        match err {
            AppError::RetriesExhausted { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("timed out"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let err: AppError = RetryError::Permanent(AppError::NotFound("sheet".into())).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_status_codes() {
        let resp = AppError::PermissionDenied("no".into()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = AppError::from(AddressError::MalformedRange("A:".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::Internal("boom".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
