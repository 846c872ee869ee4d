//! # Spec Compiler
//!
//! Turns one interface-description document on disk into a
//! [`CompiledDocument`]: read → parse → resolve/model → compile validators →
//! extract metadata. Each step has its own [`SpecError`] variant.
//!
//! OpenAPI 3.0 schemas are a JSON Schema Draft 4 dialect with a `nullable`
//! extension; they are rewritten to plain Draft 4 before compilation.
//! OpenAPI 3.1 schemas are Draft 2020-12 and compile as-is.

use std::path::Path;

use serde_json::Value;

use crate::document::{self, OpenApiVersion};
use crate::error::SpecError;
use crate::validate::SpecValidator;
use crate::violation::SchemaCause;

/// JSON Schema dialect used for every schema in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDialect {
    /// OpenAPI 3.0 (after `nullable` rewriting).
    Draft4,
    /// OpenAPI 3.1.
    Draft202012,
}

impl From<OpenApiVersion> for SchemaDialect {
    fn from(version: OpenApiVersion) -> Self {
        match version {
            OpenApiVersion::V30 => Self::Draft4,
            OpenApiVersion::V31 => Self::Draft202012,
        }
    }
}

/// A compiled document plus its `info` metadata.
#[derive(Debug)]
pub struct CompiledDocument {
    pub title: String,
    pub version: String,
    /// `info.description`, empty when absent.
    pub description: String,
    pub dialect: SchemaDialect,
    pub validator: SpecValidator,
}

/// Compile the document at `path`.
///
/// # Errors
///
/// - [`SpecError::SpecFileRead`] if the file cannot be read.
/// - [`SpecError::SpecParse`] on malformed YAML/JSON.
/// - [`SpecError::SpecModelBuild`] listing every resolution/structure error.
/// - [`SpecError::ValidatorInit`] if any schema fails to compile.
pub fn compile(path: &Path) -> Result<CompiledDocument, SpecError> {
    let raw = std::fs::read(path).map_err(|source| SpecError::SpecFileRead {
        path: path.display().to_string(),
        source,
    })?;
    let root = document::parse_document(&raw, path)?;
    let model = document::build_model(&root, path)?;
    let dialect = SchemaDialect::from(model.openapi);

    let validator = SpecValidator::from_model(&model, dialect).map_err(|failures| {
        SpecError::ValidatorInit {
            path: path.display().to_string(),
            reason: failures.join("; "),
        }
    })?;

    tracing::debug!(
        path = %path.display(),
        operations = validator.operation_count(),
        ?dialect,
        "compiled spec document"
    );

    Ok(CompiledDocument {
        title: model.title,
        version: model.version,
        description: model.description,
        dialect,
        validator,
    })
}

/// One compiled JSON Schema plus the source it was built from. The source is
/// kept for parameter coercion, which needs the declared `type`.
pub(crate) struct CompiledSchema {
    source: Value,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// Compile `schema` in `dialect`, recording a failure under `location`.
    pub(crate) fn build(
        schema: &Value,
        dialect: SchemaDialect,
        location: &str,
        failures: &mut Vec<String>,
    ) -> Option<Self> {
        let (source, draft) = match dialect {
            SchemaDialect::Draft4 => (nullable_to_draft4(schema), jsonschema::Draft::Draft4),
            SchemaDialect::Draft202012 => (schema.clone(), jsonschema::Draft::Draft202012),
        };
        match jsonschema::options().with_draft(draft).build(&source) {
            Ok(validator) => Some(Self { source, validator }),
            Err(e) => {
                failures.push(format!("{location}: {e}"));
                None
            }
        }
    }

    pub(crate) fn source(&self) -> &Value {
        &self.source
    }

    /// Every failure of `instance` against this schema.
    pub(crate) fn causes(&self, instance: &Value) -> Vec<SchemaCause> {
        self.validator
            .iter_errors(instance)
            .map(|err| {
                let location = err.instance_path.to_string();
                SchemaCause {
                    reason: err.to_string(),
                    location: if location.is_empty() { "/".to_string() } else { location },
                    keyword_location: err.schema_path.to_string(),
                }
            })
            .collect()
    }
}

/// Rewrite OpenAPI 3.0 `nullable: true` into Draft 4 (`type`/`enum` admit null).
fn nullable_to_draft4(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out: serde_json::Map<String, Value> = map
                .iter()
                .filter(|(k, _)| k.as_str() != "nullable")
                .map(|(k, v)| (k.clone(), nullable_to_draft4(v)))
                .collect();
            if map.get("nullable").and_then(Value::as_bool) == Some(true) {
                match out.get_mut("type") {
                    Some(Value::String(ty)) => {
                        let ty = std::mem::take(ty);
                        out.insert("type".into(), Value::Array(vec![ty.into(), "null".into()]));
                    }
                    Some(Value::Array(types)) if !types.iter().any(|t| t == "null") => {
                        types.push("null".into());
                    }
                    _ => {}
                }
                if let Some(Value::Array(variants)) = out.get_mut("enum") {
                    if !variants.contains(&Value::Null) {
                        variants.push(Value::Null);
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(nullable_to_draft4).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_spec(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn nullable_widens_type_and_enum() {
        let converted = nullable_to_draft4(&json!({
            "type": "object",
            "properties": {
                "nick": {"type": "string", "nullable": true},
                "tier": {"type": "string", "enum": ["a", "b"], "nullable": true},
                "plain": {"type": "string", "nullable": false}
            }
        }));
        assert_eq!(converted.pointer("/properties/nick/type"), Some(&json!(["string", "null"])));
        assert_eq!(converted.pointer("/properties/tier/enum"), Some(&json!(["a", "b", null])));
        assert!(converted.pointer("/properties/plain/nullable").is_none());
        assert_eq!(converted.pointer("/properties/plain/type"), Some(&json!("string")));
    }

    #[test]
    fn compiled_schema_reports_every_cause() {
        let mut failures = Vec::new();
        let schema = CompiledSchema::build(
            &json!({"type": "object", "required": ["username", "email"]}),
            SchemaDialect::Draft4,
            "test",
            &mut failures,
        )
        .unwrap();
        assert!(failures.is_empty());
        let causes = schema.causes(&json!({}));
        assert_eq!(causes.len(), 2);
        assert!(causes.iter().any(|c| c.reason.contains("username")));
        assert!(causes.iter().all(|c| c.location == "/"));
    }

    #[test]
    fn invalid_schema_is_recorded() {
        let mut failures = Vec::new();
        let schema = CompiledSchema::build(
            &json!({"type": "strnig"}),
            SchemaDialect::Draft202012,
            "GET /x query 'q'",
            &mut failures,
        );
        assert!(schema.is_none());
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("GET /x query 'q'"));
    }

    #[test]
    fn compile_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_spec(
            dir.path(),
            "orders.yaml",
            r#"
openapi: 3.1.0
info: {title: Orders, version: "2.0.0", description: Order listing}
paths:
  /order:
    get:
      responses:
        "200": {description: ok}
"#,
        );
        let doc = compile(&path).unwrap();
        assert_eq!(doc.title, "Orders");
        assert_eq!(doc.version, "2.0.0");
        assert_eq!(doc.description, "Order listing");
        assert_eq!(doc.dialect, SchemaDialect::Draft202012);
        assert_eq!(doc.validator.operation_count(), 1);
    }

    #[test]
    fn compile_without_description_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_spec(
            dir.path(),
            "bare.yaml",
            "openapi: 3.0.3\ninfo: {title: Bare, version: '1'}\npaths: {}\n",
        );
        let doc = compile(&path).unwrap();
        assert_eq!(doc.description, "");
        assert_eq!(doc.dialect, SchemaDialect::Draft4);
    }

    #[test]
    fn compile_missing_file_is_read_error() {
        let result = compile(Path::new("/no/such/spec.yaml"));
        assert!(matches!(result, Err(SpecError::SpecFileRead { .. })));
    }

    #[test]
    fn compile_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_spec(dir.path(), "broken.yaml", "openapi: '3.0.0'\npaths: {\n");
        assert!(matches!(compile(&path), Err(SpecError::SpecParse { .. })));
    }

    #[test]
    fn compile_bad_schema_is_validator_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_spec(
            dir.path(),
            "bad.yaml",
            r#"
openapi: 3.1.0
info: {title: Bad, version: "1"}
paths:
  /x:
    get:
      parameters:
        - {name: q, in: query, schema: {type: strnig}}
      responses: {}
"#,
        );
        match compile(&path) {
            Err(SpecError::ValidatorInit { reason, .. }) => {
                assert!(reason.contains("GET /x"), "got: {reason}")
            }
            other => panic!("expected ValidatorInit, got {other:?}"),
        }
    }
}
