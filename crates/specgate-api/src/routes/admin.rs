//! # Administrative API
//!
//! Explicit registry mutation and inspection. Requests to these routes are
//! not schema-validated.
//!
//! | Method | Path                   | Operation                       |
//! |--------|------------------------|---------------------------------|
//! | GET    | `/admin/specs`         | List loaded specs               |
//! | POST   | `/admin/specs`         | Compile and load a spec         |
//! | DELETE | `/admin/specs/:name`   | Remove a spec and its routes    |
//! | GET    | `/admin/routes`        | Route table and fallback        |
//! | PUT    | `/admin/routes`        | Map a prefix to a loaded spec   |
//! | PUT    | `/admin/fallback`      | Set or clear the fallback spec  |
//! | GET    | `/admin/metrics`       | Validation counters             |

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use specgate_schema::{RouteEntry, SpecSummary};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{check_prefix, extract_validated_json, Validate};
use crate::middleware::metrics::MetricsSnapshot;
use crate::state::ValidationState;

/// A loaded spec.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpecView {
    pub name: String,
    /// Prefix the spec was loaded with; empty if loaded without a route.
    pub base_path: String,
    pub title: String,
    pub version: String,
    pub description: String,
    /// Number of operations in the document.
    pub operations: usize,
    pub source: String,
}

impl From<SpecSummary> for SpecView {
    fn from(s: SpecSummary) -> Self {
        Self {
            name: s.name,
            base_path: s.base_path,
            title: s.title,
            version: s.version,
            description: s.description,
            operations: s.operations,
            source: s.source,
        }
    }
}

/// Load request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoadSpecRequest {
    pub name: String,
    /// Path to the document on the server's filesystem.
    pub file_path: String,
    /// Prefix to route to the spec. Omit to load without a route.
    #[serde(default)]
    pub base_path: String,
}

impl Validate for LoadSpecRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.file_path.trim().is_empty() {
            return Err("file_path must not be empty".into());
        }
        if !self.base_path.is_empty() {
            check_prefix(&self.base_path)?;
        }
        Ok(())
    }
}

/// One route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RouteView {
    pub prefix: String,
    pub spec: String,
}

impl From<RouteEntry> for RouteView {
    fn from(r: RouteEntry) -> Self {
        Self {
            prefix: r.prefix,
            spec: r.spec,
        }
    }
}

/// Route table in match order, plus the fallback.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoutesResponse {
    pub routes: Vec<RouteView>,
    pub fallback: Option<String>,
}

/// Route mapping request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddRouteRequest {
    pub prefix: String,
    pub spec: String,
}

impl Validate for AddRouteRequest {
    fn validate(&self) -> Result<(), String> {
        check_prefix(&self.prefix)
    }
}

/// Fallback request. `null` clears the fallback.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FallbackRequest {
    pub spec: Option<String>,
}

impl Validate for FallbackRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Build the admin router.
pub fn router() -> Router<ValidationState> {
    Router::new()
        .route("/admin/specs", get(list_specs).post(load_spec))
        .route("/admin/specs/:name", delete(remove_spec))
        .route("/admin/routes", get(list_routes).put(add_route))
        .route("/admin/fallback", put(set_fallback))
        .route("/admin/metrics", get(metrics))
}

fn routes_response(state: &ValidationState) -> RoutesResponse {
    RoutesResponse {
        routes: state.registry.routes().into_iter().map(RouteView::from).collect(),
        fallback: state.registry.fallback(),
    }
}

/// GET /admin/specs: List loaded specs.
#[utoipa::path(
    get,
    path = "/admin/specs",
    responses(
        (status = 200, description = "Loaded specs, sorted by name", body = Vec<SpecView>),
    ),
    tag = "admin"
)]
async fn list_specs(State(state): State<ValidationState>) -> Json<Vec<SpecView>> {
    Json(state.registry.list().into_iter().map(SpecView::from).collect())
}

/// POST /admin/specs: Compile and load a spec.
#[utoipa::path(
    post,
    path = "/admin/specs",
    request_body = LoadSpecRequest,
    responses(
        (status = 201, description = "Spec loaded", body = SpecView),
        (status = 400, description = "Malformed request", body = crate::error::ErrorBody),
        (status = 422, description = "Spec failed to compile", body = crate::error::ErrorBody),
    ),
    tag = "admin"
)]
async fn load_spec(
    State(state): State<ValidationState>,
    body: Result<Json<LoadSpecRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SpecView>), AppError> {
    let req = extract_validated_json(body)?;
    let registry = state.registry.clone();
    // Compilation reads files; keep it off the async workers.
    let spec = tokio::task::spawn_blocking(move || {
        registry.load(&req.name, &req.file_path, &req.base_path)
    })
    .await
    .map_err(|e| AppError::Internal(format!("spec load task failed: {e}")))??;
    Ok((StatusCode::CREATED, Json(SpecView::from(spec.summary()))))
}

/// DELETE /admin/specs/:name: Remove a spec and every route to it.
#[utoipa::path(
    delete,
    path = "/admin/specs/{name}",
    params(("name" = String, Path, description = "Spec name")),
    responses(
        (status = 204, description = "Spec removed"),
        (status = 404, description = "Spec not loaded", body = crate::error::ErrorBody),
    ),
    tag = "admin"
)]
async fn remove_spec(
    State(state): State<ValidationState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .registry
        .remove(&name)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| AppError::NotFound(format!("spec not loaded: {name}")))
}

/// GET /admin/routes: Route table and fallback.
#[utoipa::path(
    get,
    path = "/admin/routes",
    responses(
        (status = 200, description = "Routes in match order", body = RoutesResponse),
    ),
    tag = "admin"
)]
async fn list_routes(State(state): State<ValidationState>) -> Json<RoutesResponse> {
    Json(routes_response(&state))
}

/// PUT /admin/routes: Map a prefix to a loaded spec.
#[utoipa::path(
    put,
    path = "/admin/routes",
    request_body = AddRouteRequest,
    responses(
        (status = 200, description = "Updated routes", body = RoutesResponse),
        (status = 404, description = "Spec not loaded", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid prefix", body = crate::error::ErrorBody),
    ),
    tag = "admin"
)]
async fn add_route(
    State(state): State<ValidationState>,
    body: Result<Json<AddRouteRequest>, JsonRejection>,
) -> Result<Json<RoutesResponse>, AppError> {
    let req = extract_validated_json(body)?;
    state.registry.add_route(&req.prefix, &req.spec)?;
    Ok(Json(routes_response(&state)))
}

/// PUT /admin/fallback: Set or clear the fallback spec.
#[utoipa::path(
    put,
    path = "/admin/fallback",
    request_body = FallbackRequest,
    responses(
        (status = 200, description = "Updated routes", body = RoutesResponse),
        (status = 404, description = "Spec not loaded", body = crate::error::ErrorBody),
    ),
    tag = "admin"
)]
async fn set_fallback(
    State(state): State<ValidationState>,
    body: Result<Json<FallbackRequest>, JsonRejection>,
) -> Result<Json<RoutesResponse>, AppError> {
    let req = extract_validated_json(body)?;
    state.registry.set_fallback(req.spec.as_deref())?;
    tracing::info!(fallback = ?req.spec, "fallback spec updated");
    Ok(Json(routes_response(&state)))
}

/// GET /admin/metrics: Validation counters.
#[utoipa::path(
    get,
    path = "/admin/metrics",
    responses(
        (status = 200, description = "Counter snapshot", body = MetricsSnapshot),
    ),
    tag = "admin"
)]
async fn metrics(State(state): State<ValidationState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
