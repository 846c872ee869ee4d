//! # specgate-api: Axum Integration for the Validation Gateway
//!
//! Wraps a business router with two pipeline stages driven by the
//! compiled specs in a [`SpecRegistry`](specgate_schema::SpecRegistry):
//! a blocking request stage and a non-blocking response audit.
//!
//! ## API Surface
//!
//! | Prefix          | Module              | Validated |
//! |-----------------|---------------------|-----------|
//! | `/health/*`     | this module         | no        |
//! | `/admin/*`      | [`routes::admin`]   | no        |
//! | `/openapi.json` | [`openapi`]         | no        |
//! | everything else | caller's router     | yes       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → RequestValidation → ResponseValidation (tee) → Handler
//! ```

pub mod bootstrap;
pub mod envelope;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod sink;
pub mod state;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::state::ValidationState;

/// Apply the validation stages to `router`.
///
/// The request stage is outermost, so a rejected request never reaches the
/// response stage or the handler.
pub fn with_validation(router: Router, state: ValidationState) -> Router {
    router
        .layer(from_fn_with_state(
            state.clone(),
            middleware::response_validation::response_validation,
        ))
        .layer(from_fn_with_state(
            state,
            middleware::request_validation::request_validation,
        ))
}

/// Assemble the gateway: health probes, admin routes and `/openapi.json`
/// unvalidated, `api` behind the validation stages, all under tracing.
pub fn app(state: ValidationState, api: Router) -> Router {
    let admin = routes::admin::router()
        .merge(openapi::router())
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new()
        .merge(health)
        .merge(admin)
        .merge(with_validation(api, state))
        .layer(middleware::tracing_layer::layer())
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 once start-up has loaded the specs.
async fn readiness() -> &'static str {
    "ready"
}
