//! # Validation Configuration
//!
//! Parses the declarative validation document:
//!
//! ```yaml
//! validation:
//!   enabled: true
//!   validate_responses: false
//!   on_unresolved: open
//!   skip_paths:
//!     /health: true
//! specs:
//!   - name: users
//!     file_path: specs/users.yaml
//!     base_path: /api/v1/user
//!     enabled: true
//!     description: User management
//! ```
//!
//! The config is loaded once at start-up and is read-only afterwards.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SpecError;

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "specs/validation.yaml";

/// Default request body limit applied by the request stage (2 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Full validation config document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Process-wide validation toggles.
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Named spec entries, in load order.
    #[serde(default)]
    pub specs: Vec<SpecEntry>,
}

/// What the request stage does when no validator covers a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Let the request through unvalidated.
    #[default]
    Open,
    /// Reject the request with 500.
    Closed,
}

/// Process-wide validation toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub validate_responses: bool,
    /// Paths that bypass validation. On the wire this is a `{path: bool}`
    /// map; only `true` entries are kept.
    #[serde(default, deserialize_with = "skip_path_set")]
    pub skip_paths: BTreeSet<String>,
    #[serde(default)]
    pub on_unresolved: UnresolvedPolicy,
    /// Spec used when no route prefix matches.
    #[serde(default)]
    pub fallback_spec: Option<String>,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            validate_responses: false,
            skip_paths: BTreeSet::new(),
            on_unresolved: UnresolvedPolicy::Open,
            fallback_spec: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ValidationConfig {
    /// Whether `path` is exempt from validation.
    pub fn is_skipped(&self, path: &str) -> bool {
        self.skip_paths.contains(path)
    }
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn skip_path_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, bool>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(path, skip)| skip.then_some(path))
        .collect())
}

/// One named interface-description document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    pub name: String,
    pub file_path: String,
    /// URL prefix governed by this spec. Empty means "load but don't route".
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

impl Config {
    /// Parse raw config bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::ConfigParse`] when the document is not valid YAML,
    /// does not match the expected shape, or repeats a spec name.
    pub fn from_slice(raw: &[u8]) -> Result<Self, SpecError> {
        let config: Config =
            serde_yaml::from_slice(raw).map_err(|e| SpecError::ConfigParse(e.to_string()))?;
        config.check_unique_names()?;
        Ok(config)
    }

    /// Read and parse a config file. Relative `file_path` entries are
    /// rebased onto the config file's directory.
    ///
    /// # Errors
    ///
    /// [`SpecError::ConfigRead`] if the file cannot be read, otherwise as
    /// [`Config::from_slice`].
    pub fn from_file(path: &Path) -> Result<Self, SpecError> {
        let raw = std::fs::read(path).map_err(|source| SpecError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_slice(&raw)?;
        if let Some(dir) = path.parent() {
            config.rebase_spec_paths(dir);
        }
        Ok(config)
    }

    /// Entries with `enabled: true`, in document order.
    pub fn enabled_specs(&self) -> impl Iterator<Item = &SpecEntry> {
        self.specs.iter().filter(|s| s.enabled)
    }

    fn rebase_spec_paths(&mut self, dir: &Path) {
        for spec in &mut self.specs {
            let file = PathBuf::from(&spec.file_path);
            if file.is_relative() {
                spec.file_path = dir.join(file).display().to_string();
            }
        }
    }

    fn check_unique_names(&self) -> Result<(), SpecError> {
        let mut seen = HashSet::new();
        for spec in &self.specs {
            if spec.name.is_empty() {
                return Err(SpecError::ConfigParse(format!(
                    "spec entry for '{}' has an empty name",
                    spec.file_path
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(SpecError::ConfigParse(format!(
                    "duplicate spec name '{}'",
                    spec.name
                )));
            }
        }
        Ok(())
    }
}
