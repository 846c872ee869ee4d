//! # Gateway Bootstrap
//!
//! Builds the [`ValidationState`] from the validation config at start-up.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Load Config**: Parse the YAML validation config.
//! 2. **Load Specs**: Compile every enabled entry in order. The first
//!    failure aborts start-up; a partly loaded registry never serves.
//! 3. **Set Fallback**: Apply `validation.fallback_spec`, which must name
//!    a loaded spec.
//! 4. **Log Banner**: Specs, routes, and policies.
//!
//! With `validation.enabled: false` no spec is compiled and both stages
//! pass everything through.

use std::path::Path;

use specgate_schema::{Config, SpecError, SpecRegistry};

use crate::state::ValidationState;

/// Errors during gateway bootstrap. All are start-up-fatal.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The config file could not be read or parsed.
    #[error("invalid validation config: {0}")]
    Config(#[source] SpecError),

    /// A configured spec failed to load.
    #[error("failed to load specs: {0}")]
    SpecLoad(#[source] SpecError),

    /// `fallback_spec` names a spec that is not loaded.
    #[error("invalid fallback spec: {0}")]
    Fallback(#[source] SpecError),
}

/// Load the config at `path` and build the gateway state.
pub fn bootstrap(path: &Path) -> Result<ValidationState, BootstrapError> {
    let config = Config::from_file(path).map_err(BootstrapError::Config)?;
    bootstrap_from_config(config)
}

/// Build the gateway state from an already parsed config.
pub fn bootstrap_from_config(config: Config) -> Result<ValidationState, BootstrapError> {
    let registry = SpecRegistry::new();

    if !config.validation.enabled {
        tracing::warn!("validation disabled, requests and responses pass through unchecked");
        return Ok(ValidationState::new(registry, config.validation));
    }

    let loaded = registry
        .load_from_config(&config.specs)
        .map_err(BootstrapError::SpecLoad)?;
    registry
        .set_fallback(config.validation.fallback_spec.as_deref())
        .map_err(BootstrapError::Fallback)?;

    log_banner(&registry, &config, loaded);
    Ok(ValidationState::new(registry, config.validation))
}

fn log_banner(registry: &SpecRegistry, config: &Config, loaded: usize) {
    tracing::info!(
        specs = loaded,
        validate_responses = config.validation.validate_responses,
        on_unresolved = ?config.validation.on_unresolved,
        fallback = ?config.validation.fallback_spec,
        skip_paths = config.validation.skip_paths.len(),
        "validation enabled"
    );
    for route in registry.routes() {
        tracing::info!(prefix = %route.prefix, spec = %route.spec, "route");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = "openapi: 3.0.3\ninfo: {title: T, version: '1'}\npaths: {}\n";

    fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
        std::fs::write(dir.join("a.yaml"), SPEC).unwrap();
        let path = dir.join("validation.yaml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_enabled_specs_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "validation: {enabled: true, fallback_spec: a}\n\
             specs:\n  - {name: a, file_path: a.yaml, base_path: /a, enabled: true}\n",
        );
        let state = bootstrap(&path).unwrap();
        assert_eq!(state.registry.len(), 1);
        assert_eq!(state.registry.fallback().as_deref(), Some("a"));
        assert_eq!(state.registry.resolve("/a/x").unwrap().name(), "a");
    }

    #[test]
    fn disabled_validation_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "validation: {enabled: false}\nspecs: []\n");
        let state = bootstrap(&path).unwrap();
        assert!(state.registry.is_empty());
    }

    #[test]
    fn no_specs_is_fatal_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "validation: {enabled: true}\nspecs: []\n");
        assert!(matches!(
            bootstrap(&path),
            Err(BootstrapError::SpecLoad(SpecError::NoSpecsConfigured))
        ));
    }

    #[test]
    fn missing_spec_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "validation: {enabled: true}\n\
             specs:\n  - {name: gone, file_path: gone.yaml, base_path: /g, enabled: true}\n",
        );
        assert!(matches!(
            bootstrap(&path),
            Err(BootstrapError::SpecLoad(SpecError::SpecFileRead { .. }))
        ));
    }

    #[test]
    fn unknown_fallback_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "validation: {enabled: true, fallback_spec: nope}\n\
             specs:\n  - {name: a, file_path: a.yaml, enabled: true}\n",
        );
        assert!(matches!(bootstrap(&path), Err(BootstrapError::Fallback(_))));
    }

    #[test]
    fn missing_config_is_config_error() {
        assert!(matches!(
            bootstrap(Path::new("/no/such/validation.yaml")),
            Err(BootstrapError::Config(SpecError::ConfigRead { .. }))
        ));
    }
}
