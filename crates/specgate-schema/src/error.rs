//! # Error Types
//!
//! Every failure the compiler, config loader, and registry can produce.
//! All variants except [`SpecError::NoValidatorFound`] and
//! [`SpecError::UnknownSpec`] are start-up-fatal for a serving process.

use thiserror::Error;

/// Errors returned by config loading, spec compilation, and registry operations.
#[derive(Error, Debug)]
pub enum SpecError {
    /// The validation config file could not be read.
    #[error("failed to read validation config {path}: {source}")]
    ConfigRead {
        /// Path of the config file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The validation config document is malformed.
    #[error("failed to parse validation config: {0}")]
    ConfigParse(String),

    /// An interface-description document could not be read.
    #[error("failed to read spec file {path}: {source}")]
    SpecFileRead {
        /// Path of the spec file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An interface-description document is not valid YAML/JSON.
    #[error("failed to parse spec document {path}: {reason}")]
    SpecParse {
        /// Path of the spec file.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// Reference resolution or structural checks failed. Carries every error found.
    #[error("failed to build document model for {path}: {}", errors.join("; "))]
    SpecModelBuild {
        /// Path of the spec file.
        path: String,
        /// All resolution and structure errors, in discovery order.
        errors: Vec<String>,
    },

    /// A schema in the resolved model could not be compiled.
    #[error("failed to create validator for {path}: {reason}")]
    ValidatorInit {
        /// Path of the spec file.
        path: String,
        /// Compilation failures, joined.
        reason: String,
    },

    /// The config lists no specs at all.
    #[error("no specs configured in validation config")]
    NoSpecsConfigured,

    /// No route prefix (and no fallback) covers the request path.
    #[error("no suitable validator found for path: {0}")]
    NoValidatorFound(String),

    /// An administrative operation named a spec that is not loaded.
    #[error("spec not loaded: {0}")]
    UnknownSpec(String),

    /// A spec directory could not be enumerated.
    #[error("failed to read spec directory {path}: {source}")]
    DirectoryRead {
        /// Directory path.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_build_lists_every_error() {
        let err = SpecError::SpecModelBuild {
            path: "users.yaml".into(),
            errors: vec!["unresolved reference '#/a'".into(), "unresolved reference '#/b'".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("users.yaml"));
        assert!(msg.contains("#/a"));
        assert!(msg.contains("#/b"));
    }

    #[test]
    fn no_validator_display_includes_path() {
        let err = SpecError::NoValidatorFound("/api/v9/thing".into());
        assert_eq!(
            err.to_string(),
            "no suitable validator found for path: /api/v9/thing"
        );
    }
}
