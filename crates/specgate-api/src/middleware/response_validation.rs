//! # Response Validation Stage
//!
//! Runs around the handler when `validate_responses` is on. The response
//! body is wrapped in a [`TeeBody`]: the client gets every byte as the
//! handler produces it, and once the body completes the captured copy is
//! audited against the governing spec. Violations go to the
//! [`ViolationSink`](crate::sink::ViolationSink), one entry each. The
//! delivered response is never altered.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use specgate_schema::ResponseParts;

use crate::middleware::capture::TeeBody;
use crate::sink::AuditContext;
use crate::state::ValidationState;

pub async fn response_validation(
    State(state): State<ValidationState>,
    request: Request,
    next: Next,
) -> Response {
    let config = &state.config;
    let path = request.uri().path().to_string();
    if !config.enabled || !config.validate_responses || config.is_skipped(&path) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let status = parts.status;
    let headers = parts.headers.clone();
    let tee = TeeBody::new(
        body,
        Box::new(move |captured| audit(&state, &method, &path, status, &headers, &captured)),
    );
    Response::from_parts(parts, Body::new(tee))
}

fn audit(
    state: &ValidationState,
    method: &Method,
    path: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) {
    if body.is_empty() {
        return;
    }
    let spec = match state.registry.resolve(path) {
        Ok(spec) => spec,
        Err(err) => {
            tracing::debug!(%path, error = %err, "no spec governs path, response not audited");
            return;
        }
    };

    let violations = spec.validator().validate_response(&ResponseParts {
        method,
        path,
        status,
        headers,
        body,
    });
    state.metrics.response_audited(violations.len());

    let ctx = AuditContext {
        spec: spec.name(),
        method,
        path,
        status,
    };
    for violation in &violations {
        state.sink.record(&ctx, violation);
    }
}
