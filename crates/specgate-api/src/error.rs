//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse` for the
//! administrative surface and for the gateway's own failures (fail-closed
//! resolution misses, oversized bodies).
//!
//! Schema violations of a request are NOT reported through this type: they
//! use the fixed [`ErrorEnvelope`](specgate_schema::ErrorEnvelope) wire shape
//! written by [`crate::envelope`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use specgate_schema::SpecError;
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATOR_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client-facing context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Administrative input rejected, e.g. a spec that fails to compile (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body exceeds the configured limit (413).
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Fail-closed policy: no spec governs the path (500).
    #[error("no suitable validator found for path: {0}")]
    ValidatorNotFound(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::ValidatorNotFound(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "VALIDATOR_NOT_FOUND")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match &self {
            Self::ValidatorNotFound(path) => Some(serde_json::json!({ "path": path })),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Registry and compiler errors surfaced by administrative operations.
impl From<SpecError> for AppError {
    fn from(err: SpecError) -> Self {
        match err {
            SpecError::UnknownSpec(_) => Self::NotFound(err.to_string()),
            SpecError::NoValidatorFound(path) => Self::ValidatorNotFound(path),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (
                AppError::Validation("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (
                AppError::PayloadTooLarge { limit: 10 },
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
            ),
            (
                AppError::ValidatorNotFound("/x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "VALIDATOR_NOT_FOUND",
            ),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code), "{err}");
        }
    }

    #[test]
    fn spec_errors_convert() {
        let unknown = AppError::from(SpecError::UnknownSpec("users".into()));
        assert!(matches!(unknown, AppError::NotFound(_)));
        let miss = AppError::from(SpecError::NoValidatorFound("/x".into()));
        assert!(matches!(miss, AppError::ValidatorNotFound(p) if p == "/x"));
        let parse = AppError::from(SpecError::SpecParse {
            path: "a.yaml".into(),
            reason: "bad".into(),
        });
        assert!(matches!(parse, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn validator_not_found_body_carries_path() {
        let response = AppError::ValidatorNotFound("/api/v9/x".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "VALIDATOR_NOT_FOUND");
        assert_eq!(body.error.details.unwrap()["path"], "/api/v9/x");
    }

    #[tokio::test]
    async fn internal_message_is_hidden() {
        let response = AppError::Internal("db password wrong".into()).into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.message, "An internal error occurred");
    }
}
