//! # Application State
//!
//! [`ValidationState`] is built once at start-up and handed by value
//! (cheap `Arc` clones) to both validation stages and the administrative
//! routes. There is no global registry.

use std::sync::Arc;

use specgate_schema::{SpecRegistry, ValidationConfig};

use crate::middleware::metrics::ValidationMetrics;
use crate::sink::{TracingSink, ViolationSink};

/// Shared state for the validation stages and admin routes.
#[derive(Clone)]
pub struct ValidationState {
    pub registry: Arc<SpecRegistry>,
    /// Read-only after start-up.
    pub config: Arc<ValidationConfig>,
    pub sink: Arc<dyn ViolationSink>,
    pub metrics: ValidationMetrics,
}

impl std::fmt::Debug for ValidationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationState")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("sink", &"[dyn ViolationSink]")
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl ValidationState {
    /// State with the default [`TracingSink`].
    pub fn new(registry: SpecRegistry, config: ValidationConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
            sink: Arc::new(TracingSink),
            metrics: ValidationMetrics::new(),
        }
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn ViolationSink>) -> Self {
        self.sink = sink;
        self
    }
}
