//! # specgate-cli: Validation Config Tooling
//!
//! Offline counterpart of the gateway: every subcommand builds the same
//! [`SpecRegistry`] the server builds at start-up, without binding a port.
//!
//! ## Subcommands
//!
//! - `check`: Compile every enabled spec and print a summary
//! - `resolve`: Show which spec governs a request path
//! - `validate`: Validate one request and print the error envelope
//!
//! ## Exit Codes
//!
//! `0` success, `1` validation failure or start-up-fatal config error.

pub mod check;
pub mod resolve;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use specgate_schema::{Config, SpecRegistry, DEFAULT_CONFIG_PATH};

/// Config path from `--config`, or the default.
pub fn config_path(arg: Option<&Path>) -> PathBuf {
    arg.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the config and compile every enabled spec, as the server does.
///
/// Specs load regardless of `validation.enabled`, since the tooling exists
/// to inspect them.
pub fn load_registry(path: &Path) -> Result<(Config, SpecRegistry)> {
    let config = Config::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    let registry = SpecRegistry::new();
    registry
        .load_from_config(&config.specs)
        .context("failed to load specs")?;
    registry
        .set_fallback(config.validation.fallback_spec.as_deref())
        .context("invalid fallback_spec")?;
    Ok((config, registry))
}

#[cfg(test)]
pub(crate) fn fixture_config() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates
    dir.pop(); // repo root
    dir.join("specs").join("validation.yaml")
}
