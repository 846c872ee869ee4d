//! # Middleware
//!
//! - `request_validation`: blocks requests that violate their operation.
//! - `response_validation`: audits responses without altering them.
//! - `capture`: the tee body used by the response stage.
//! - `metrics`: counters shared by both stages.
//! - `tracing_layer`: the `TraceLayer` around the whole gateway.

pub mod capture;
pub mod metrics;
pub mod request_validation;
pub mod response_validation;
pub mod tracing_layer;
