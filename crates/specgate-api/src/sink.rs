//! # Diagnostic Sink
//!
//! Destination for response-audit violations. Response violations are never
//! surfaced to the client; they go to a [`ViolationSink`], one call per
//! violation.

use axum::http::{Method, StatusCode};
use parking_lot::Mutex;
use specgate_schema::Violation;

/// The exchange a response violation was found in.
#[derive(Debug, Clone, Copy)]
pub struct AuditContext<'a> {
    pub spec: &'a str,
    pub method: &'a Method,
    pub path: &'a str,
    pub status: StatusCode,
}

/// Receives response violations.
pub trait ViolationSink: Send + Sync + 'static {
    fn record(&self, ctx: &AuditContext<'_>, violation: &Violation);
}

/// Default sink: one `warn` event per violation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ViolationSink for TracingSink {
    fn record(&self, ctx: &AuditContext<'_>, violation: &Violation) {
        tracing::warn!(
            spec = ctx.spec,
            method = %ctx.method,
            path = ctx.path,
            status = ctx.status.as_u16(),
            message = %violation.message,
            reason = %violation.reason,
            causes = violation.schema_validation_errors.len(),
            "response failed schema validation"
        );
    }
}

/// One entry captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedViolation {
    pub spec: String,
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub violation: Violation,
}

/// Keeps every violation in memory. Used by embedders that forward audit
/// results elsewhere, and by tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<RecordedViolation>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RecordedViolation> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<RecordedViolation> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl ViolationSink for MemorySink {
    fn record(&self, ctx: &AuditContext<'_>, violation: &Violation) {
        self.entries.lock().push(RecordedViolation {
            spec: ctx.spec.to_string(),
            method: ctx.method.clone(),
            path: ctx.path.to_string(),
            status: ctx.status,
            violation: violation.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgate_schema::ValidationType;

    #[test]
    fn memory_sink_records_and_drains() {
        let sink = MemorySink::new();
        let ctx = AuditContext {
            spec: "users",
            method: &Method::GET,
            path: "/api/v1/user",
            status: StatusCode::OK,
        };
        let v = Violation::new(ValidationType::Response, None, "bad", "why");
        sink.record(&ctx, &v);
        sink.record(&ctx, &v);
        assert_eq!(sink.len(), 2);
        let drained = sink.drain();
        assert_eq!(drained[0].spec, "users");
        assert_eq!(drained[0].status, StatusCode::OK);
        assert!(sink.is_empty());
    }

    #[test]
    fn tracing_sink_accepts_violation() {
        let ctx = AuditContext {
            spec: "orders",
            method: &Method::POST,
            path: "/api/v1/order",
            status: StatusCode::CREATED,
        };
        TracingSink.record(&ctx, &Violation::new(ValidationType::Response, None, "m", "r"));
    }
}
