//! # Validate Subcommand
//!
//! Runs request validation offline: the request is described on the
//! command line, resolved against the registry, and checked exactly as the
//! gateway's request stage would check it. Violations are printed as the
//! same JSON error envelope the gateway answers with.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use specgate_schema::{ErrorEnvelope, RequestParts, SpecRegistry, Violation};

/// Arguments for `specgate validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Validation config (default: specs/validation.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// HTTP method.
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Request path, without the query string.
    #[arg(long)]
    pub path: String,

    /// Raw query string, without the leading `?`.
    #[arg(long)]
    pub query: Option<String>,

    /// Request header as `Name: value`. Repeatable.
    #[arg(long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// File holding the request body.
    #[arg(long)]
    pub body: Option<PathBuf>,

    /// Shorthand for `--header 'Content-Type: ...'`.
    #[arg(long)]
    pub content_type: Option<String>,
}

/// Execute the validate subcommand. Exit code 1 when the request has
/// violations or no spec governs the path.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let (_, registry) = crate::load_registry(&crate::config_path(args.config.as_deref()))?;
    let (spec, violations) = validate_request(&registry, args)?;

    if violations.is_empty() {
        println!("OK: {} {} is valid against spec '{spec}'", args.method, args.path);
        return Ok(0);
    }

    let envelope = ErrorEnvelope::request_failed(&args.method.to_uppercase(), &args.path, violations);
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(1)
}

/// Resolve and validate the described request, returning the governing
/// spec's name and every violation.
fn validate_request(registry: &SpecRegistry, args: &ValidateArgs) -> Result<(String, Vec<Violation>)> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("invalid method '{}'", args.method))?;
    let headers = build_headers(&args.headers, args.content_type.as_deref())?;
    let body = match &args.body {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read body {}", path.display()))?,
        None => Vec::new(),
    };

    let spec = registry.resolve(&args.path)?;
    tracing::debug!(spec = spec.name(), path = %args.path, "resolved spec");

    let violations = spec.validator().validate_request(&RequestParts {
        method: &method,
        path: &args.path,
        query: args.query.as_deref(),
        headers: &headers,
        body: &body,
    });
    Ok((spec.name().to_string(), violations))
}

fn build_headers(raw: &[String], content_type: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for line in raw {
        let Some((name, value)) = line.split_once(':') else {
            bail!("header '{line}' is not of the form 'Name: value'");
        };
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .with_context(|| format!("invalid header name in '{line}'"))?;
        let value = HeaderValue::from_str(value.trim())
            .with_context(|| format!("invalid header value in '{line}'"))?;
        headers.append(name, value);
    }
    if let Some(ct) = content_type {
        let value = HeaderValue::from_str(ct)
            .with_context(|| format!("invalid content type '{ct}'"))?;
        headers.insert(CONTENT_TYPE, value);
    }
    Ok(headers)
}
