//! # OpenAPI Specification Assembly
//!
//! Documents the administrative surface with utoipa derive macros and serves
//! it at `/openapi.json`. The validated business API is described by the
//! loaded documents themselves, not here.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

/// OpenAPI document for the gateway's own endpoints.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "specgate: Validation Gateway Administration",
        version = "0.1.0",
        description = "Spec registry management and validation counters for the specgate request/response validation layer.",
        license(name = "MIT OR Apache-2.0")
    ),
    paths(
        crate::routes::admin::list_specs,
        crate::routes::admin::load_spec,
        crate::routes::admin::remove_spec,
        crate::routes::admin::list_routes,
        crate::routes::admin::add_route,
        crate::routes::admin::set_fallback,
        crate::routes::admin::metrics,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::middleware::metrics::MetricsSnapshot,
        crate::routes::admin::SpecView,
        crate::routes::admin::LoadSpecRequest,
        crate::routes::admin::RouteView,
        crate::routes::admin::RoutesResponse,
        crate::routes::admin::AddRouteRequest,
        crate::routes::admin::FallbackRequest,
    )),
    tags(
        (name = "admin", description = "Spec registry administration"),
    )
)]
pub struct ApiDoc;

/// Router serving `/openapi.json`.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
