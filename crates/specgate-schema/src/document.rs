//! # Document Model
//!
//! Parses an OpenAPI document, inlines every `$ref` (local and relative-file),
//! and builds the operation model the validator compiles from.
//!
//! ## Reference resolution
//!
//! References are resolved relative to the document that contains them.
//! External documents are read at most once per compile. A reference that
//! points back into its own resolution chain is cut at that position and
//! replaced by an empty (accept-anything) schema, so recursive schemas
//! compile instead of looping.
//!
//! Resolution and structure problems are collected, not short-circuited: a
//! broken document reports every problem in one
//! [`SpecError::SpecModelBuild`].

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use http::Method;
use serde_json::{Map, Number, Value};

use crate::error::SpecError;

/// Operation keys recognised inside a path item, in document order.
const OPERATION_KEYS: [(&str, Method); 8] = [
    ("get", Method::GET),
    ("put", Method::PUT),
    ("post", Method::POST),
    ("delete", Method::DELETE),
    ("options", Method::OPTIONS),
    ("head", Method::HEAD),
    ("patch", Method::PATCH),
    ("trace", Method::TRACE),
];

/// OpenAPI major/minor line of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenApiVersion {
    V30,
    V31,
}

/// The resolved, structurally checked form of one document.
#[derive(Debug, Clone)]
pub struct DocumentModel {
    pub openapi: OpenApiVersion,
    pub title: String,
    pub version: String,
    pub description: String,
    /// Path components of `servers[].url`, without trailing `/`.
    pub server_base_paths: Vec<String>,
    pub operations: Vec<OperationModel>,
}

#[derive(Debug, Clone)]
pub struct OperationModel {
    pub method: Method,
    pub path: String,
    pub operation_id: Option<String>,
    pub parameters: Vec<ParameterModel>,
    pub request_body: Option<RequestBodyModel>,
    pub responses: Vec<ResponseModel>,
}

impl OperationModel {
    /// `"POST /user"` style label used in diagnostics.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterModel {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    /// Whether array values arrive as repeated keys (`true`) or one
    /// comma-separated value (`false`).
    pub explode: bool,
    pub schema: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct MediaModel {
    /// Lower-cased media type essence (parameters stripped).
    pub media_type: String,
    pub schema: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct RequestBodyModel {
    pub required: bool,
    pub content: Vec<MediaModel>,
}

#[derive(Debug, Clone)]
pub struct HeaderModel {
    pub name: String,
    pub required: bool,
    pub schema: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ResponseModel {
    /// Status key as written: `"200"`, `"2XX"`, or `"default"`.
    pub status: String,
    pub headers: Vec<HeaderModel>,
    pub content: Vec<MediaModel>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse raw YAML or JSON bytes into a JSON value tree.
///
/// # Errors
///
/// [`SpecError::SpecParse`] on syntax errors, non-mapping roots, or values
/// that have no JSON equivalent.
pub fn parse_document(raw: &[u8], path: &Path) -> Result<Value, SpecError> {
    let parse_err = |reason: String| SpecError::SpecParse {
        path: path.display().to_string(),
        reason,
    };
    let yaml: serde_yaml::Value = serde_yaml::from_slice(raw).map_err(|e| parse_err(e.to_string()))?;
    let value = yaml_to_json(yaml).map_err(&parse_err)?;
    if !value.is_object() {
        return Err(parse_err("document root must be a mapping".to_string()));
    }
    Ok(value)
}

/// Convert YAML into JSON, stringifying scalar keys (`200:` → `"200"`).
fn yaml_to_json(yaml: serde_yaml::Value) -> Result<Value, String> {
    Ok(match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                Value::Number(
                    Number::from_f64(f).ok_or_else(|| format!("non-finite number {n}"))?,
                )
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported mapping key {other:?}")),
                };
                map.insert(key, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

// ---------------------------------------------------------------------------
// Reference resolution
// ---------------------------------------------------------------------------

struct RefResolver {
    documents: HashMap<PathBuf, Value>,
    unreadable: HashSet<PathBuf>,
    stack: Vec<String>,
    errors: Vec<String>,
}

impl RefResolver {
    fn new(root_path: &Path, root: Value) -> Self {
        let mut documents = HashMap::new();
        documents.insert(normalize(root_path), root);
        Self {
            documents,
            unreadable: HashSet::new(),
            stack: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Deep-copy `value` with every `$ref` replaced by its target.
    fn inline(&mut self, value: &Value, doc: &Path) -> Value {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    return self.follow(reference, doc);
                }
                Value::Object(
                    map.iter()
                        .map(|(k, v)| (k.clone(), self.inline(v, doc)))
                        .collect(),
                )
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.inline(v, doc)).collect()),
            other => other.clone(),
        }
    }

    fn follow(&mut self, reference: &str, doc: &Path) -> Value {
        let (file, pointer) = reference.split_once('#').unwrap_or((reference, ""));
        let target_doc = if file.is_empty() {
            doc.to_path_buf()
        } else {
            normalize(&doc.parent().unwrap_or_else(|| Path::new("")).join(file))
        };

        let key = format!("{}#{}", target_doc.display(), pointer);
        if self.stack.contains(&key) {
            tracing::debug!(reference, "recursive reference cut");
            return Value::Object(Map::new());
        }

        if !self.ensure_loaded(&target_doc, reference) {
            return Value::Object(Map::new());
        }

        let target = self
            .documents
            .get(&target_doc)
            .and_then(|d| d.pointer(pointer))
            .cloned();
        let Some(target) = target else {
            self.errors.push(format!(
                "unresolved reference '{reference}' in {}",
                doc.display()
            ));
            return Value::Object(Map::new());
        };

        self.stack.push(key);
        let resolved = self.inline(&target, &target_doc);
        self.stack.pop();
        resolved
    }

    fn ensure_loaded(&mut self, path: &Path, reference: &str) -> bool {
        if self.documents.contains_key(path) {
            return true;
        }
        if self.unreadable.contains(path) {
            return false;
        }
        let loaded = std::fs::read(path)
            .map_err(|e| format!("failed to read referenced document {}: {e}", path.display()))
            .and_then(|raw| {
                parse_document(&raw, path).map_err(|e| format!("reference '{reference}': {e}"))
            });
        match loaded {
            Ok(value) => {
                self.documents.insert(path.to_path_buf(), value);
                true
            }
            Err(reason) => {
                self.errors.push(reason);
                self.unreadable.insert(path.to_path_buf());
                false
            }
        }
    }
}

/// Lexically remove `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Model building
// ---------------------------------------------------------------------------

/// Resolve references and build the operation model.
///
/// # Errors
///
/// [`SpecError::SpecModelBuild`] with every resolution and structure error.
pub fn build_model(root: &Value, path: &Path) -> Result<DocumentModel, SpecError> {
    let mut errors = Vec::new();

    let openapi = match root.get("openapi") {
        Some(Value::String(v)) if v.starts_with("3.0") => Some(OpenApiVersion::V30),
        Some(Value::String(v)) if v.starts_with("3.1") => Some(OpenApiVersion::V31),
        Some(other) => {
            errors.push(format!("unsupported openapi version {other}"));
            None
        }
        None => {
            errors.push("missing 'openapi' version field".to_string());
            None
        }
    };

    let info = root.get("info").cloned().unwrap_or(Value::Null);
    let text = |key: &str| {
        info.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let server_base_paths = server_base_paths(root.get("servers"), &mut errors);

    if let Some(schemas) = root.pointer("/components/schemas") {
        match schemas.as_object() {
            Some(map) => {
                for (name, schema) in map {
                    if !(schema.is_object() || schema.is_boolean()) {
                        errors.push(format!(
                            "components.schemas.{name} must be an object or boolean"
                        ));
                    }
                }
            }
            None => errors.push("components.schemas must be a mapping".to_string()),
        }
    }

    let mut resolver = RefResolver::new(path, root.clone());
    let paths = match root.get("paths") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(p @ Value::Object(_)) => resolver.inline(p, &normalize(path)),
        Some(_) => {
            errors.push("'paths' must be a mapping".to_string());
            Value::Object(Map::new())
        }
    };
    errors.append(&mut resolver.errors);

    let operations = collect_operations(&paths, &mut errors);

    match openapi {
        Some(openapi) if errors.is_empty() => Ok(DocumentModel {
            openapi,
            title: text("title"),
            version: text("version"),
            description: text("description"),
            server_base_paths,
            operations,
        }),
        _ => Err(SpecError::SpecModelBuild {
            path: path.display().to_string(),
            errors,
        }),
    }
}

fn server_base_paths(servers: Option<&Value>, errors: &mut Vec<String>) -> Vec<String> {
    let Some(servers) = servers else {
        return Vec::new();
    };
    let Some(servers) = servers.as_array() else {
        errors.push("'servers' must be a sequence".to_string());
        return Vec::new();
    };

    let mut bases = Vec::new();
    for server in servers {
        let Some(raw) = server.get("url").and_then(Value::as_str) else {
            errors.push("server entry without 'url'".to_string());
            continue;
        };
        let mut url = raw.to_string();
        if let Some(vars) = server.get("variables").and_then(Value::as_object) {
            for (name, var) in vars {
                if let Some(default) = var.get("default").and_then(Value::as_str) {
                    url = url.replace(&format!("{{{name}}}"), default);
                }
            }
        }
        let path = if url.contains("://") {
            match url::Url::parse(&url) {
                Ok(parsed) => parsed.path().to_string(),
                Err(e) => {
                    errors.push(format!("invalid server url '{raw}': {e}"));
                    continue;
                }
            }
        } else {
            url
        };
        let trimmed = path.trim_end_matches('/');
        if trimmed.starts_with('/') && !trimmed.contains('{') && !bases.iter().any(|b| b == trimmed) {
            bases.push(trimmed.to_string());
        }
    }
    bases
}

fn collect_operations(paths: &Value, errors: &mut Vec<String>) -> Vec<OperationModel> {
    let mut operations = Vec::new();
    let Some(paths) = paths.as_object() else {
        return operations;
    };

    for (template, item) in paths {
        if !template.starts_with('/') {
            errors.push(format!("path '{template}' must begin with '/'"));
            continue;
        }
        let Some(item) = item.as_object() else {
            errors.push(format!("path item '{template}' must be a mapping"));
            continue;
        };
        let shared = parse_parameters(item.get("parameters"), template, errors);

        for (key, method) in &OPERATION_KEYS {
            let Some(op) = item.get(*key) else { continue };
            let label = format!("{method} {template}");
            let Some(op) = op.as_object() else {
                errors.push(format!("operation '{label}' must be a mapping"));
                continue;
            };

            let mut parameters = shared.clone();
            for param in parse_parameters(op.get("parameters"), &label, errors) {
                match parameters
                    .iter_mut()
                    .find(|p| p.name == param.name && p.location == param.location)
                {
                    Some(existing) => *existing = param,
                    None => parameters.push(param),
                }
            }

            let request_body = op
                .get("requestBody")
                .and_then(|b| parse_request_body(b, &label, errors));
            let responses = parse_responses(op.get("responses"), &label, errors);

            operations.push(OperationModel {
                method: method.clone(),
                path: template.clone(),
                operation_id: op
                    .get("operationId")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                parameters,
                request_body,
                responses,
            });
        }
    }
    operations
}

fn parse_parameters(value: Option<&Value>, context: &str, errors: &mut Vec<String>) -> Vec<ParameterModel> {
    let Some(value) = value else {
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        errors.push(format!("{context}: 'parameters' must be a sequence"));
        return Vec::new();
    };

    let mut params = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let name = item.get("name").and_then(Value::as_str);
        let location = item
            .get("in")
            .and_then(Value::as_str)
            .and_then(ParameterLocation::parse);
        let (Some(name), Some(location)) = (name, location) else {
            errors.push(format!(
                "{context}: parameter #{index} needs a 'name' and an 'in' of path, query, header or cookie"
            ));
            continue;
        };

        let style = item.get("style").and_then(Value::as_str);
        let form_style = match style {
            Some(s) => s == "form",
            None => matches!(location, ParameterLocation::Query | ParameterLocation::Cookie),
        };
        let explode = item
            .get("explode")
            .and_then(Value::as_bool)
            .unwrap_or(form_style);

        let schema = item.get("schema").cloned().or_else(|| {
            item.get("content")
                .and_then(Value::as_object)
                .and_then(|c| c.values().next())
                .and_then(|m| m.get("schema"))
                .cloned()
        });

        params.push(ParameterModel {
            name: name.to_string(),
            location,
            required: location == ParameterLocation::Path
                || item.get("required").and_then(Value::as_bool).unwrap_or(false),
            explode,
            schema,
        });
    }
    params
}

fn parse_content(value: Option<&Value>, context: &str, errors: &mut Vec<String>) -> Vec<MediaModel> {
    let Some(value) = value else {
        return Vec::new();
    };
    let Some(content) = value.as_object() else {
        errors.push(format!("{context}: 'content' must be a mapping"));
        return Vec::new();
    };
    content
        .iter()
        .map(|(media_type, media)| MediaModel {
            media_type: media_essence(media_type),
            schema: media.get("schema").cloned(),
        })
        .collect()
}

fn parse_request_body(value: &Value, context: &str, errors: &mut Vec<String>) -> Option<RequestBodyModel> {
    if !value.is_object() {
        errors.push(format!("{context}: 'requestBody' must be a mapping"));
        return None;
    }
    Some(RequestBodyModel {
        required: value.get("required").and_then(Value::as_bool).unwrap_or(false),
        content: parse_content(value.get("content"), context, errors),
    })
}

fn parse_responses(value: Option<&Value>, context: &str, errors: &mut Vec<String>) -> Vec<ResponseModel> {
    let Some(value) = value else {
        return Vec::new();
    };
    let Some(responses) = value.as_object() else {
        errors.push(format!("{context}: 'responses' must be a mapping"));
        return Vec::new();
    };

    let mut out = Vec::with_capacity(responses.len());
    for (status, response) in responses {
        if !is_status_key(status) {
            errors.push(format!("{context}: invalid response status key '{status}'"));
            continue;
        }
        let headers = response
            .get("headers")
            .and_then(Value::as_object)
            .map(|headers| {
                headers
                    .iter()
                    .map(|(name, header)| HeaderModel {
                        name: name.clone(),
                        required: header.get("required").and_then(Value::as_bool).unwrap_or(false),
                        schema: header.get("schema").cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        out.push(ResponseModel {
            status: status.clone(),
            headers,
            content: parse_content(response.get("content"), context, errors),
        });
    }
    out
}

fn is_status_key(key: &str) -> bool {
    if key == "default" {
        return true;
    }
    match key.as_bytes() {
        [b'1'..=b'5', rest @ ..] if rest.len() == 2 => {
            rest.iter().all(u8::is_ascii_digit) || rest.eq_ignore_ascii_case(b"XX")
        }
        _ => false,
    }
}

/// `"Application/JSON; charset=utf-8"` → `"application/json"`.
pub fn media_essence(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model_from(yaml: &str) -> Result<DocumentModel, SpecError> {
        let path = Path::new("inline.yaml");
        let root = parse_document(yaml.as_bytes(), path)?;
        build_model(&root, path)
    }

    #[test]
    fn numeric_response_keys_become_strings() {
        let root = parse_document(b"responses:\n  200: {description: ok}\n", Path::new("x.yaml")).unwrap();
        assert!(root.pointer("/responses/200").is_some());
    }

    #[test]
    fn non_mapping_root_is_parse_error() {
        let result = parse_document(b"- just\n- a list\n", Path::new("x.yaml"));
        assert!(matches!(result, Err(SpecError::SpecParse { .. })));
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let result = parse_document(b"openapi: [3.0", Path::new("x.yaml"));
        assert!(matches!(result, Err(SpecError::SpecParse { .. })));
    }

    #[test]
    fn builds_operations_with_inlined_refs() {
        let model = model_from(
            r##"
openapi: 3.0.3
info: {title: Users, version: "1.2.0", description: User area}
servers:
  - url: https://example.com/api/v1/
paths:
  /user/{id}:
    parameters:
      - {name: id, in: path, schema: {type: integer}}
    get:
      operationId: getUser
      responses:
        "200":
          description: ok
          content:
            application/json; charset=utf-8:
              schema: {$ref: "#/components/schemas/User"}
components:
  schemas:
    User:
      type: object
      properties:
        name: {type: string}
"##,
        )
        .unwrap();

        assert_eq!(model.openapi, OpenApiVersion::V30);
        assert_eq!(model.title, "Users");
        assert_eq!(model.version, "1.2.0");
        assert_eq!(model.description, "User area");
        assert_eq!(model.server_base_paths, vec!["/api/v1".to_string()]);
        assert_eq!(model.operations.len(), 1);

        let op = &model.operations[0];
        assert_eq!(op.label(), "GET /user/{id}");
        assert_eq!(op.operation_id.as_deref(), Some("getUser"));
        assert!(op.parameters[0].required, "path params are always required");
        let media = &op.responses[0].content[0];
        assert_eq!(media.media_type, "application/json");
        assert_eq!(
            media.schema.as_ref().unwrap().pointer("/properties/name/type"),
            Some(&json!("string"))
        );
    }

    #[test]
    fn operation_parameters_override_path_level() {
        let model = model_from(
            r#"
openapi: 3.1.0
info: {title: t, version: "1"}
paths:
  /order:
    parameters:
      - {name: limit, in: query, required: true, schema: {type: integer}}
    get:
      parameters:
        - {name: limit, in: query, required: false, schema: {type: integer}}
        - {name: X-Trace, in: header, schema: {type: string}}
      responses: {}
"#,
        )
        .unwrap();
        let params = &model.operations[0].parameters;
        assert_eq!(params.len(), 2);
        assert!(!params[0].required);
        assert!(params[0].explode);
        assert!(!params[1].explode);
    }

    #[test]
    fn missing_refs_are_all_reported() {
        let err = model_from(
            r##"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /a:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Missing1"}
  /b:
    post:
      requestBody:
        content:
          application/json:
            schema: {$ref: "#/components/schemas/Missing2"}
      responses: {}
"##,
        )
        .unwrap_err();
        match err {
            SpecError::SpecModelBuild { errors, .. } => {
                assert_eq!(errors.len(), 2, "{errors:?}");
                assert!(errors[0].contains("Missing1"));
                assert!(errors[1].contains("Missing2"));
            }
            other => panic!("expected SpecModelBuild, got {other:?}"),
        }
    }

    #[test]
    fn recursive_refs_are_cut() {
        let model = model_from(
            r##"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /tree:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Node"}
components:
  schemas:
    Node:
      type: object
      properties:
        children:
          type: array
          items: {$ref: "#/components/schemas/Node"}
"##,
        )
        .unwrap();
        let schema = model.operations[0].responses[0].content[0].schema.clone().unwrap();
        assert_eq!(schema.pointer("/properties/children/items"), Some(&json!({})));
    }

    #[test]
    fn unsupported_version_and_bad_paths_collected() {
        let err = model_from(
            r#"
openapi: 2.0
info: {title: t, version: "1"}
paths:
  user:
    get: {responses: {}}
"#,
        )
        .unwrap_err();
        match err {
            SpecError::SpecModelBuild { errors, .. } => {
                assert_eq!(errors.len(), 2, "{errors:?}");
            }
            other => panic!("expected SpecModelBuild, got {other:?}"),
        }
    }

    #[test]
    fn bad_parameter_and_status_key_reported() {
        let err = model_from(
            r#"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /x:
    get:
      parameters:
        - {name: q, in: body}
      responses:
        "20": {description: nope}
"#,
        )
        .unwrap_err();
        match err {
            SpecError::SpecModelBuild { errors, .. } => assert_eq!(errors.len(), 2, "{errors:?}"),
            other => panic!("expected SpecModelBuild, got {other:?}"),
        }
    }

    #[test]
    fn external_refs_resolve_relative_to_referencing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("common")).unwrap();
        std::fs::write(
            dir.path().join("common/shared.yaml"),
            r##"
components:
  schemas:
    Error:
      type: object
      properties:
        code: {$ref: "#/components/schemas/Code"}
    Code: {type: integer}
"##,
        )
        .unwrap();
        let main = dir.path().join("main.yaml");
        std::fs::write(
            &main,
            r##"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /x:
    get:
      responses:
        default:
          description: err
          content:
            application/json:
              schema: {$ref: "common/shared.yaml#/components/schemas/Error"}
"##,
        )
        .unwrap();

        let root = parse_document(&std::fs::read(&main).unwrap(), &main).unwrap();
        let model = build_model(&root, &main).unwrap();
        let schema = model.operations[0].responses[0].content[0].schema.clone().unwrap();
        assert_eq!(schema.pointer("/properties/code"), Some(&json!({"type": "integer"})));
    }

    #[test]
    fn unreadable_external_ref_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.yaml");
        std::fs::write(
            &main,
            r#"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /x:
    get:
      parameters:
        - {name: a, in: query, schema: {$ref: "gone.yaml#/A"}}
        - {name: b, in: query, schema: {$ref: "gone.yaml#/B"}}
      responses: {}
"#,
        )
        .unwrap();
        let root = parse_document(&std::fs::read(&main).unwrap(), &main).unwrap();
        match build_model(&root, &main).unwrap_err() {
            SpecError::SpecModelBuild { errors, .. } => {
                assert_eq!(errors.len(), 1, "{errors:?}");
                assert!(errors[0].contains("gone.yaml"));
            }
            other => panic!("expected SpecModelBuild, got {other:?}"),
        }
    }

    #[test]
    fn server_variables_use_defaults() {
        let mut errors = Vec::new();
        let servers = json!([
            {"url": "https://{host}/{base}", "variables": {"host": {"default": "api.example.com"}, "base": {"default": "v2"}}},
            {"url": "/"},
            {"url": "/internal/"}
        ]);
        let bases = server_base_paths(Some(&servers), &mut errors);
        assert!(errors.is_empty());
        assert_eq!(bases, vec!["/v2".to_string(), "/internal".to_string()]);
    }

    #[test]
    fn status_keys() {
        assert!(is_status_key("200"));
        assert!(is_status_key("4XX"));
        assert!(is_status_key("5xx"));
        assert!(is_status_key("default"));
        assert!(!is_status_key("20"));
        assert!(!is_status_key("600"));
        assert!(!is_status_key("abc"));
    }

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(
            normalize(Path::new("specs/./users/../common/r.yaml")),
            PathBuf::from("specs/common/r.yaml")
        );
    }
}
