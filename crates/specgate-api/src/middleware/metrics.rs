//! # Validation Metrics
//!
//! Lightweight in-process counters using atomics, incremented by the two
//! validation stages and read by `GET /admin/metrics`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

/// Shared metrics state. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct ValidationMetrics {
    requests_validated: Arc<AtomicU64>,
    requests_rejected: Arc<AtomicU64>,
    requests_unvalidated: Arc<AtomicU64>,
    responses_audited: Arc<AtomicU64>,
    response_violations: Arc<AtomicU64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetricsSnapshot {
    /// Requests checked against a spec and passed on.
    pub requests_validated: u64,
    /// Requests answered with a 400 envelope.
    pub requests_rejected: u64,
    /// Requests let through because no spec governs their path.
    pub requests_unvalidated: u64,
    pub responses_audited: u64,
    pub response_violations: u64,
}

impl ValidationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_validated(&self) {
        self.requests_validated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_unvalidated(&self) {
        self.requests_unvalidated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one audited response and the violations it produced.
    pub fn response_audited(&self, violations: usize) {
        self.responses_audited.fetch_add(1, Ordering::Relaxed);
        self.response_violations
            .fetch_add(violations as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_validated: self.requests_validated.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            requests_unvalidated: self.requests_unvalidated.load(Ordering::Relaxed),
            responses_audited: self.responses_audited.load(Ordering::Relaxed),
            response_violations: self.response_violations.load(Ordering::Relaxed),
        }
    }
}
