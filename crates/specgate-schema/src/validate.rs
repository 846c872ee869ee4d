//! # Request and Response Validation
//!
//! [`SpecValidator`] is the compiled form of one document's operations. It
//! checks an HTTP exchange, described with `http` crate types, and returns
//! every [`Violation`] it finds. An empty list means the exchange conforms.
//!
//! ## Operation lookup
//!
//! The request path is matched against every path template, both as-is and
//! with each server base path (`servers[].url` path component) stripped.
//! Templates with more literal segments win over templated ones, so
//! `/user/me` beats `/user/{id}`.
//!
//! ## Parameter coercion
//!
//! Path, query, header and cookie values arrive as strings. Before schema
//! validation they are coerced by the schema's declared `type`: `integer`,
//! `number`, `boolean`, `object` (JSON text) and `array` (repeated keys when
//! `explode`, otherwise one comma-separated value). A value that does not
//! coerce stays a string and fails the schema's type check.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, StatusCode};
use serde_json::{Map, Number, Value};

use crate::compile::{CompiledSchema, SchemaDialect};
use crate::document::{media_essence, DocumentModel, ParameterLocation};
use crate::template::PathTemplate;
use crate::violation::{ValidationSubType, ValidationType, Violation};

/// Header parameters OpenAPI says to ignore.
const IGNORED_HEADER_PARAMS: [&str; 3] = ["accept", "content-type", "authorization"];

/// A request as seen by the validator.
#[derive(Debug, Clone, Copy)]
pub struct RequestParts<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
}

/// A response plus the request line it answers.
#[derive(Debug, Clone, Copy)]
pub struct ResponseParts<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub status: StatusCode,
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
}

/// Validator for every operation of one document.
#[derive(Debug)]
pub struct SpecValidator {
    server_base_paths: Vec<String>,
    operations: Vec<CompiledOperation>,
}

#[derive(Debug)]
struct CompiledOperation {
    method: Method,
    template: PathTemplate,
    operation_id: Option<String>,
    parameters: Vec<CompiledParameter>,
    body: Option<CompiledBody>,
    responses: Vec<CompiledResponse>,
}

#[derive(Debug)]
struct CompiledParameter {
    name: String,
    location: ParameterLocation,
    required: bool,
    explode: bool,
    schema: Option<CompiledSchema>,
}

#[derive(Debug)]
struct CompiledBody {
    required: bool,
    content: Vec<CompiledMedia>,
}

#[derive(Debug)]
struct CompiledMedia {
    media_type: String,
    schema: Option<CompiledSchema>,
}

#[derive(Debug)]
struct CompiledResponse {
    status: String,
    headers: Vec<CompiledHeader>,
    content: Vec<CompiledMedia>,
}

#[derive(Debug)]
struct CompiledHeader {
    name: String,
    required: bool,
    schema: Option<CompiledSchema>,
}

struct Lookup<'v> {
    operation: &'v CompiledOperation,
    captures: Vec<(String, String)>,
}

impl SpecValidator {
    /// Compile every schema in `model`.
    ///
    /// # Errors
    ///
    /// Returns every compilation failure, each prefixed with its location.
    pub fn from_model(model: &DocumentModel, dialect: SchemaDialect) -> Result<Self, Vec<String>> {
        let mut failures = Vec::new();
        let compile = |schema: &Option<Value>, location: String, failures: &mut Vec<String>| {
            schema
                .as_ref()
                .and_then(|s| CompiledSchema::build(s, dialect, &location, failures))
        };

        let mut operations = Vec::with_capacity(model.operations.len());
        for op in &model.operations {
            let label = op.label();
            let parameters = op
                .parameters
                .iter()
                .map(|p| CompiledParameter {
                    name: p.name.clone(),
                    location: p.location,
                    required: p.required,
                    explode: p.explode,
                    schema: compile(
                        &p.schema,
                        format!("{label} {} parameter '{}'", p.location.as_str(), p.name),
                        &mut failures,
                    ),
                })
                .collect();

            let body = op.request_body.as_ref().map(|b| CompiledBody {
                required: b.required,
                content: b
                    .content
                    .iter()
                    .map(|m| CompiledMedia {
                        media_type: m.media_type.clone(),
                        schema: compile(
                            &m.schema,
                            format!("{label} request body '{}'", m.media_type),
                            &mut failures,
                        ),
                    })
                    .collect(),
            });

            let responses = op
                .responses
                .iter()
                .map(|r| CompiledResponse {
                    status: r.status.clone(),
                    headers: r
                        .headers
                        .iter()
                        .map(|h| CompiledHeader {
                            name: h.name.clone(),
                            required: h.required,
                            schema: compile(
                                &h.schema,
                                format!("{label} response {} header '{}'", r.status, h.name),
                                &mut failures,
                            ),
                        })
                        .collect(),
                    content: r
                        .content
                        .iter()
                        .map(|m| CompiledMedia {
                            media_type: m.media_type.clone(),
                            schema: compile(
                                &m.schema,
                                format!("{label} response {} body '{}'", r.status, m.media_type),
                                &mut failures,
                            ),
                        })
                        .collect(),
                })
                .collect();

            operations.push(CompiledOperation {
                method: op.method.clone(),
                template: PathTemplate::parse(&op.path),
                operation_id: op.operation_id.clone(),
                parameters,
                body,
                responses,
            });
        }

        if failures.is_empty() {
            Ok(Self {
                server_base_paths: model.server_base_paths.clone(),
                operations,
            })
        } else {
            Err(failures)
        }
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// `(method, path template, operationId)` for every operation, in
    /// document order.
    pub fn operations(&self) -> impl Iterator<Item = (&Method, &str, Option<&str>)> {
        self.operations
            .iter()
            .map(|op| (&op.method, op.template.as_str(), op.operation_id.as_deref()))
    }

    pub fn server_base_paths(&self) -> &[String] {
        &self.server_base_paths
    }

    /// Check a request. Returns every violation found.
    pub fn validate_request(&self, req: &RequestParts<'_>) -> Vec<Violation> {
        let lookup = match self.find_operation(req.method, req.path) {
            Ok(lookup) => lookup,
            Err(violation) => return vec![violation],
        };
        let op = lookup.operation;

        let query: Vec<(String, String)> = req
            .query
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        let cookies = parse_cookies(req.headers);

        let mut violations = Vec::new();
        for param in &op.parameters {
            let values: Vec<String> = match param.location {
                ParameterLocation::Path => lookup
                    .captures
                    .iter()
                    .filter(|(name, _)| *name == param.name)
                    .map(|(_, value)| value.clone())
                    .collect(),
                ParameterLocation::Query => query
                    .iter()
                    .filter(|(name, _)| *name == param.name)
                    .map(|(_, value)| value.clone())
                    .collect(),
                ParameterLocation::Header => {
                    if IGNORED_HEADER_PARAMS
                        .iter()
                        .any(|h| h.eq_ignore_ascii_case(&param.name))
                    {
                        continue;
                    }
                    header_values(req.headers, &param.name)
                }
                ParameterLocation::Cookie => cookies
                    .iter()
                    .filter(|(name, _)| *name == param.name)
                    .map(|(_, value)| value.clone())
                    .collect(),
            };
            if let Some(v) = check_parameter(param, &values) {
                violations.push(v);
            }
        }

        if let Some(body) = &op.body {
            if let Some(v) = check_request_body(op, body, req) {
                violations.push(v);
            }
        }
        violations
    }

    /// Check a response against the operation that answered the request.
    pub fn validate_response(&self, res: &ResponseParts<'_>) -> Vec<Violation> {
        let lookup = match self.find_operation(res.method, res.path) {
            Ok(lookup) => lookup,
            Err(violation) => return vec![violation],
        };
        let op = lookup.operation;
        if op.responses.is_empty() {
            return Vec::new();
        }

        let status = res.status.as_u16().to_string();
        let Some(response) = find_response(&op.responses, &status) else {
            return vec![Violation::new(
                ValidationType::Response,
                Some(ValidationSubType::Status),
                format!(
                    "{} operation response code '{status}' for '{}' is not defined",
                    op.method,
                    op.template.as_str()
                ),
                format!("no response is declared for status {status} and there is no default"),
            )];
        };

        let mut violations = Vec::new();
        for header in &response.headers {
            if header.name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            let values = header_values(res.headers, &header.name);
            if values.is_empty() {
                if header.required {
                    violations.push(Violation::new(
                        ValidationType::Response,
                        Some(ValidationSubType::Header),
                        format!("Response header '{}' is missing", header.name),
                        format!(
                            "the response header '{}' is required for status {}",
                            header.name, response.status
                        ),
                    ));
                }
                continue;
            }
            let Some(schema) = &header.schema else { continue };
            let causes = schema.causes(&coerce(&values, schema.source(), false));
            if !causes.is_empty() {
                violations.push(
                    Violation::new(
                        ValidationType::Response,
                        Some(ValidationSubType::Header),
                        format!("Response header '{}' failed to validate", header.name),
                        format!(
                            "the response header '{}' value '{}' does not match its schema",
                            header.name,
                            values.join(",")
                        ),
                    )
                    .with_causes(causes),
                );
            }
        }

        if !response.content.is_empty() && !res.body.is_empty() {
            let actual = content_type(res.headers);
            match match_media(&response.content, &actual) {
                None => violations.push(Violation::new(
                    ValidationType::Response,
                    Some(ValidationSubType::ContentType),
                    format!(
                        "{} / {} operation response content type '{actual}' does not exist",
                        op.method, response.status
                    ),
                    format!(
                        "the content type '{actual}' is not declared for '{}'",
                        op.template.as_str()
                    ),
                )),
                Some(media) => {
                    if let Some(v) = check_body(
                        media,
                        &actual,
                        res.body,
                        ValidationType::Response,
                        &format!("{} response body for '{}'", op.method, op.template.as_str()),
                    ) {
                        violations.push(v);
                    }
                }
            }
        }
        violations
    }

    fn find_operation(&self, method: &Method, path: &str) -> Result<Lookup<'_>, Violation> {
        let mut candidates = vec![path];
        for base in &self.server_base_paths {
            if let Some(rest) = path.strip_prefix(base.as_str()) {
                if rest.is_empty() {
                    candidates.push("/");
                } else if rest.starts_with('/') {
                    candidates.push(rest);
                }
            }
        }

        let mut path_matched = false;
        let mut best: Option<(usize, Lookup<'_>)> = None;
        for candidate in candidates {
            for op in &self.operations {
                let Some(captures) = op.template.matches(candidate) else {
                    continue;
                };
                path_matched = true;
                if op.method != *method {
                    continue;
                }
                let rank = op.template.literal_count();
                if best.as_ref().map_or(true, |(r, _)| rank > *r) {
                    best = Some((
                        rank,
                        Lookup {
                            operation: op,
                            captures,
                        },
                    ));
                }
            }
        }

        match best {
            Some((_, lookup)) => Ok(lookup),
            None if path_matched => Err(Violation::new(
                ValidationType::Path,
                Some(ValidationSubType::Method),
                format!("{method} operation request for path '{path}' not found"),
                format!("path '{path}' exists but does not declare a {method} operation"),
            )),
            None => Err(Violation::new(
                ValidationType::Path,
                None,
                format!("Path '{path}' not found"),
                format!("no {method} operation matches path '{path}'"),
            )),
        }
    }
}

fn location_label(location: ParameterLocation) -> (&'static str, ValidationSubType) {
    match location {
        ParameterLocation::Path => ("Path", ValidationSubType::Path),
        ParameterLocation::Query => ("Query", ValidationSubType::Query),
        ParameterLocation::Header => ("Header", ValidationSubType::Header),
        ParameterLocation::Cookie => ("Cookie", ValidationSubType::Cookie),
    }
}

fn check_parameter(param: &CompiledParameter, values: &[String]) -> Option<Violation> {
    let (label, sub) = location_label(param.location);
    let loc = param.location.as_str();
    if values.is_empty() {
        return param.required.then(|| {
            Violation::new(
                ValidationType::Parameter,
                Some(sub),
                format!("{label} parameter '{}' is missing", param.name),
                format!("the {loc} parameter '{}' is required", param.name),
            )
        });
    }
    let schema = param.schema.as_ref()?;
    let causes = schema.causes(&coerce(values, schema.source(), param.explode));
    if causes.is_empty() {
        return None;
    }
    Some(
        Violation::new(
            ValidationType::Parameter,
            Some(sub),
            format!("{label} parameter '{}' failed to validate", param.name),
            format!(
                "the {loc} parameter '{}' value '{}' does not match its schema",
                param.name,
                values.join(",")
            ),
        )
        .with_causes(causes),
    )
}

fn check_request_body(
    op: &CompiledOperation,
    body: &CompiledBody,
    req: &RequestParts<'_>,
) -> Option<Violation> {
    let subject = format!("{} request body for '{}'", op.method, op.template.as_str());
    if req.body.is_empty() {
        return body.required.then(|| {
            Violation::new(
                ValidationType::RequestBody,
                Some(ValidationSubType::Missing),
                format!("{subject} is missing"),
                "the request body is required but none was sent",
            )
        });
    }
    if body.content.is_empty() {
        return None;
    }
    let actual = content_type(req.headers);
    let Some(media) = match_media(&body.content, &actual) else {
        return Some(Violation::new(
            ValidationType::RequestBody,
            Some(ValidationSubType::ContentType),
            format!(
                "{} operation request content type '{actual}' does not exist",
                op.method
            ),
            format!(
                "'{}' accepts {}",
                op.template.as_str(),
                body.content
                    .iter()
                    .map(|m| m.media_type.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    };
    check_body(media, &actual, req.body, ValidationType::RequestBody, &subject)
}

/// Decode `raw` per its actual media type and validate it.
fn check_body(
    media: &CompiledMedia,
    actual: &str,
    raw: &[u8],
    validation_type: ValidationType,
    subject: &str,
) -> Option<Violation> {
    let schema = media.schema.as_ref()?;
    let value = if is_json(actual) {
        match serde_json::from_slice::<Value>(raw) {
            Ok(value) => value,
            Err(e) => {
                return Some(Violation::new(
                    validation_type,
                    Some(ValidationSubType::Schema),
                    format!("{subject} is not valid JSON"),
                    e.to_string(),
                ))
            }
        }
    } else if actual == "application/x-www-form-urlencoded" {
        decode_form(raw, schema.source())
    } else {
        Value::String(String::from_utf8_lossy(raw).into_owned())
    };

    let causes = schema.causes(&value);
    if causes.is_empty() {
        return None;
    }
    Some(
        Violation::new(
            validation_type,
            Some(ValidationSubType::Schema),
            format!("{subject} failed to validate schema"),
            format!("{} schema violation(s)", causes.len()),
        )
        .with_causes(causes),
    )
}

fn find_response<'r>(responses: &'r [CompiledResponse], status: &str) -> Option<&'r CompiledResponse> {
    let range = status.get(..1).map(|class| format!("{class}XX"));
    responses
        .iter()
        .find(|r| r.status == status)
        .or_else(|| {
            let range = range.as_deref()?;
            responses.iter().find(|r| r.status.eq_ignore_ascii_case(range))
        })
        .or_else(|| responses.iter().find(|r| r.status == "default"))
}

fn match_media<'m>(content: &'m [CompiledMedia], actual: &str) -> Option<&'m CompiledMedia> {
    let major = actual.split('/').next().unwrap_or_default();
    content
        .iter()
        .find(|m| m.media_type == actual)
        .or_else(|| {
            content
                .iter()
                .find(|m| !major.is_empty() && m.media_type.strip_suffix("/*") == Some(major))
        })
        .or_else(|| content.iter().find(|m| m.media_type == "*/*"))
}

fn is_json(media_type: &str) -> bool {
    media_type == "application/json" || media_type.ends_with("+json")
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(media_essence)
        .unwrap_or_default()
}

fn header_values(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    header_values(headers, "cookie")
        .iter()
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Form bodies: one property per key, repeated keys become arrays when the
/// property is declared as one.
fn decode_form(raw: &[u8], schema: &Value) -> Value {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in url::form_urlencoded::parse(raw) {
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.into_owned()),
            None => grouped.push((key.into_owned(), vec![value.into_owned()])),
        }
    }
    let empty = Value::Object(Map::new());
    let object = grouped
        .into_iter()
        .map(|(key, values)| {
            let property = schema
                .get("properties")
                .and_then(|p| p.get(&key))
                .unwrap_or(&empty);
            let value = coerce(&values, property, true);
            (key, value)
        })
        .collect();
    Value::Object(object)
}

fn declared_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(ty)) => Some(ty.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null"),
        _ => None,
    }
}

fn coerce(values: &[String], schema: &Value, explode: bool) -> Value {
    if declared_type(schema) == Some("array") {
        let items = schema.get("items").unwrap_or(&Value::Null);
        let parts: Vec<&str> = if explode {
            values.iter().map(String::as_str).collect()
        } else {
            values.iter().flat_map(|v| v.split(',')).collect()
        };
        return Value::Array(parts.into_iter().map(|p| coerce_scalar(p, items)).collect());
    }
    match values.first() {
        Some(raw) => coerce_scalar(raw, schema),
        None => Value::Null,
    }
}

fn coerce_scalar(raw: &str, schema: &Value) -> Value {
    let fallback = || Value::String(raw.to_string());
    match declared_type(schema) {
        Some("integer") => raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| fallback()),
        Some("number") => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(fallback),
        Some("boolean") => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => fallback(),
        },
        Some("object") => serde_json::from_str::<Value>(raw)
            .ok()
            .filter(Value::is_object)
            .unwrap_or_else(fallback),
        _ => fallback(),
    }
}
