//! # Violations
//!
//! A [`Violation`] is one structural disagreement between an HTTP exchange
//! and its schema. One violation may bundle several [`SchemaCause`]s, e.g.
//! a request body missing two required fields is one violation with two
//! causes.
//!
//! [`ErrorEnvelope`] is the wire body of a rejected request:
//!
//! ```json
//! { "error": "validation_failed", "message": "request validation failed",
//!   "validation_error_details": [...], "path": "/api/v1/user",
//!   "method": "POST", "error_count": 2 }
//! ```

use serde::{Deserialize, Serialize};

/// Which part of the exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationType {
    Path,
    Parameter,
    RequestBody,
    Response,
}

/// Narrower classification within a [`ValidationType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSubType {
    Method,
    Path,
    Query,
    Header,
    Cookie,
    Missing,
    ContentType,
    Schema,
    Status,
}

/// One schema keyword failure inside a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCause {
    /// Human-readable failure, e.g. `"username" is a required property`.
    pub reason: String,
    /// JSON Pointer into the validated value.
    pub location: String,
    /// JSON Pointer into the schema.
    pub keyword_location: String,
}

/// One structural disagreement between a request/response and its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub message: String,
    pub reason: String,
    pub validation_type: ValidationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_sub_type: Option<ValidationSubType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_validation_errors: Vec<SchemaCause>,
}

impl Violation {
    pub fn new(
        validation_type: ValidationType,
        validation_sub_type: Option<ValidationSubType>,
        message: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            reason: reason.into(),
            validation_type,
            validation_sub_type,
            schema_validation_errors: Vec::new(),
        }
    }

    /// Attach bundled schema causes.
    pub fn with_causes(mut self, causes: Vec<SchemaCause>) -> Self {
        self.schema_validation_errors = causes;
        self
    }

    /// Number of individual failures this violation stands for. A violation
    /// with no bundled causes counts once.
    pub fn cause_count(&self) -> usize {
        self.schema_validation_errors.len().max(1)
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.message, self.reason)?;
        for cause in &self.schema_validation_errors {
            write!(f, "; {} at '{}'", cause.reason, cause.location)?;
        }
        Ok(())
    }
}

/// Sum of [`Violation::cause_count`] over all violations.
pub fn error_count(violations: &[Violation]) -> usize {
    violations.iter().map(Violation::cause_count).sum()
}

/// Body of a rejected request (HTTP 400, `application/json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub message: String,
    pub validation_error_details: Vec<Violation>,
    pub path: String,
    pub method: String,
    pub error_count: usize,
}

impl ErrorEnvelope {
    /// Machine-readable `error` value.
    pub const ERROR: &'static str = "validation_failed";
    /// Human-readable `message` value.
    pub const MESSAGE: &'static str = "request validation failed";

    /// Build the envelope for a request that produced `violations`.
    pub fn request_failed(method: &str, path: &str, violations: Vec<Violation>) -> Self {
        Self {
            error: Self::ERROR.to_string(),
            message: Self::MESSAGE.to_string(),
            error_count: error_count(&violations),
            validation_error_details: violations,
            path: path.to_string(),
            method: method.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cause(reason: &str) -> SchemaCause {
        SchemaCause {
            reason: reason.to_string(),
            location: "/".to_string(),
            keyword_location: "/required".to_string(),
        }
    }

    #[test]
    fn error_count_sums_nested_causes() {
        let body = Violation::new(
            ValidationType::RequestBody,
            Some(ValidationSubType::Schema),
            "POST request body for '/user' failed to validate schema",
            "3 schema violation(s)",
        )
        .with_causes(vec![cause("a"), cause("b"), cause("c")]);
        let query = Violation::new(
            ValidationType::Parameter,
            Some(ValidationSubType::Query),
            "Query parameter 'page' is missing",
            "the query parameter 'page' is required",
        );
        assert_eq!(error_count(&[body, query]), 4);
    }

    #[test]
    fn envelope_fields() {
        let v = Violation::new(ValidationType::Path, None, "Path '/x' not found", "no match");
        let env = ErrorEnvelope::request_failed("GET", "/x", vec![v]);
        assert_eq!(env.error, "validation_failed");
        assert_eq!(env.message, "request validation failed");
        assert_eq!(env.error_count, 1);
        assert_eq!(env.method, "GET");
        assert_eq!(env.path, "/x");
    }

    #[test]
    fn serializes_snake_case_and_omits_empty() {
        let v = Violation::new(
            ValidationType::RequestBody,
            Some(ValidationSubType::ContentType),
            "m",
            "r",
        );
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["validation_type"], "request_body");
        assert_eq!(json["validation_sub_type"], "content_type");
        assert!(json.get("schema_validation_errors").is_none());
    }

    #[test]
    fn display_includes_causes() {
        let v = Violation::new(ValidationType::Response, None, "bad", "why")
            .with_causes(vec![cause("\"id\" is a required property")]);
        let text = v.to_string();
        assert!(text.starts_with("bad: why"));
        assert!(text.contains("\"id\" is a required property"));
    }
}
