//! # Request Validation Stage
//!
//! Runs before the handler:
//!
//! 1. Skip paths and a disabled config pass straight through.
//! 2. The governing spec is resolved (read lock only). A miss follows the
//!    configured [`UnresolvedPolicy`]: `open` passes through unvalidated,
//!    `closed` answers 500 `VALIDATOR_NOT_FOUND`.
//! 3. The body is buffered (413 past `max_body_bytes`) and the request is
//!    validated. Any violation answers 400 with the error envelope and the
//!    handler never runs; otherwise the request continues with its body
//!    re-attached unchanged.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use specgate_schema::{RequestParts, UnresolvedPolicy};

use crate::envelope;
use crate::error::AppError;
use crate::state::ValidationState;

pub async fn request_validation(
    State(state): State<ValidationState>,
    request: Request,
    next: Next,
) -> Response {
    let config = &state.config;
    let path = request.uri().path().to_string();
    if !config.enabled || config.is_skipped(&path) {
        return next.run(request).await;
    }

    let spec = match state.registry.resolve(&path) {
        Ok(spec) => spec,
        Err(err) => match config.on_unresolved {
            UnresolvedPolicy::Open => {
                tracing::debug!(%path, error = %err, "no spec governs path, passing through");
                state.metrics.request_unvalidated();
                return next.run(request).await;
            }
            UnresolvedPolicy::Closed => {
                tracing::warn!(%path, "no spec governs path, rejecting");
                return AppError::ValidatorNotFound(path).into_response();
            }
        },
    };

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, config.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let too_large = err
                .into_inner()
                .downcast_ref::<LengthLimitError>()
                .is_some();
            if too_large {
                return AppError::PayloadTooLarge {
                    limit: config.max_body_bytes,
                }
                .into_response();
            }
            return AppError::BadRequest("failed to read request body".to_string()).into_response();
        }
    };

    let violations = spec.validator().validate_request(&RequestParts {
        method: &parts.method,
        path: &path,
        query: parts.uri.query(),
        headers: &parts.headers,
        body: &bytes,
    });

    if !violations.is_empty() {
        tracing::info!(
            spec = spec.name(),
            method = %parts.method,
            %path,
            violations = violations.len(),
            "request rejected"
        );
        state.metrics.request_rejected();
        return envelope::reject(&parts.method, &path, violations);
    }

    state.metrics.request_validated();
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
