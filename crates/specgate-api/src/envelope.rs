//! # Error Envelope Writer
//!
//! Turns the violations of a rejected request into the HTTP 400
//! `application/json` response. The body shape is
//! [`ErrorEnvelope`](specgate_schema::ErrorEnvelope).

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use specgate_schema::{ErrorEnvelope, Violation};

/// Build the 400 response for `violations` (non-empty).
pub fn reject(method: &Method, path: &str, violations: Vec<Violation>) -> Response {
    let envelope = ErrorEnvelope::request_failed(method.as_str(), path, violations);
    (StatusCode::BAD_REQUEST, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use http_body_util::BodyExt;
    use specgate_schema::{SchemaCause, ValidationSubType, ValidationType};

    fn cause(field: &str) -> SchemaCause {
        SchemaCause {
            reason: format!("\"{field}\" is a required property"),
            location: "/".into(),
            keyword_location: "/required".into(),
        }
    }

    #[tokio::test]
    async fn writes_400_json_envelope() {
        let violations = vec![
            Violation::new(
                ValidationType::RequestBody,
                Some(ValidationSubType::Schema),
                "POST request body for '/user' failed to validate schema",
                "2 schema violation(s)",
            )
            .with_causes(vec![cause("username"), cause("email")]),
            Violation::new(
                ValidationType::Parameter,
                Some(ValidationSubType::Query),
                "Query parameter 'page' failed to validate",
                "bad",
            ),
        ];
        let response = reject(&Method::POST, "/api/v1/user", violations);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["message"], "request validation failed");
        assert_eq!(body["path"], "/api/v1/user");
        assert_eq!(body["method"], "POST");
        assert_eq!(body["error_count"], 3);
        assert_eq!(body["validation_error_details"].as_array().unwrap().len(), 2);
    }
}
