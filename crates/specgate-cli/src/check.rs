//! # Check Subcommand
//!
//! Loads a validation config and compiles every enabled spec, failing on
//! the first start-up-fatal error exactly as the server would.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use specgate_schema::{SpecSummary, SpecValidator};

/// Arguments for `specgate check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Validation config (default: specs/validation.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also list every operation and server base path of each spec.
    #[arg(long)]
    pub operations: bool,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let path = crate::config_path(args.config.as_deref());
    let (config, registry) = crate::load_registry(&path)?;

    let specs = registry.list();
    for spec in &specs {
        println!("{}", summary_line(spec));
        if args.operations {
            if let Some(compiled) = registry.get(&spec.name) {
                for line in operation_lines(compiled.validator()) {
                    println!("{line}");
                }
            }
        }
    }
    println!(
        "\n{} spec(s) loaded from {}; validation {}, responses {}, unresolved: {:?}",
        specs.len(),
        path.display(),
        on_off(config.validation.enabled),
        on_off(config.validation.validate_responses),
        config.validation.on_unresolved,
    );
    if let Some(fallback) = registry.fallback() {
        println!("fallback spec: {fallback}");
    }
    Ok(0)
}

fn summary_line(spec: &SpecSummary) -> String {
    let base = if spec.base_path.is_empty() {
        "(unrouted)"
    } else {
        spec.base_path.as_str()
    };
    format!(
        "  OK: {:<12} {:<20} {} {} ({} operation(s))",
        spec.name, base, spec.title, spec.version, spec.operations
    )
}

fn operation_lines(validator: &SpecValidator) -> Vec<String> {
    let mut lines: Vec<String> = validator
        .server_base_paths()
        .iter()
        .map(|base| format!("      server base {base}"))
        .collect();
    lines.extend(validator.operations().map(|(method, template, id)| match id {
        Some(id) => format!("      {:<7} {template} ({id})", method.as_str()),
        None => format!("      {:<7} {template}", method.as_str()),
    }));
    lines
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_fixture_config_succeeds() {
        let args = CheckArgs {
            config: Some(crate::fixture_config()),
            operations: true,
        };
        assert_eq!(run_check(&args).unwrap(), 0);
    }

    #[test]
    fn operation_lines_list_servers_and_operations() {
        let (_, registry) = crate::load_registry(&crate::fixture_config()).unwrap();
        let users = registry.get("users").unwrap();
        let lines = operation_lines(users.validator());
        assert!(lines.iter().any(|l| l.contains("server base /api/v1")));
        assert!(lines.iter().any(|l| l.contains("POST") && l.contains("/user")));
        assert_eq!(lines.len(), users.validator().server_base_paths().len() + users.validator().operation_count());
    }

    #[test]
    fn check_fails_on_broken_spec() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "openapi: 2.0\ninfo: {}\n").unwrap();
        let config = dir.path().join("validation.yaml");
        std::fs::write(
            &config,
            "specs:\n  - {name: bad, file_path: bad.yaml, base_path: /b, enabled: true}\n",
        )
        .unwrap();
        let args = CheckArgs {
            config: Some(config),
            operations: false,
        };
        let err = run_check(&args).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load specs"));
    }

    #[test]
    fn summary_line_marks_unrouted_specs() {
        let spec = SpecSummary {
            name: "x".into(),
            base_path: String::new(),
            title: "X".into(),
            version: "1".into(),
            description: String::new(),
            operations: 0,
            source: "x.yaml".into(),
        };
        assert!(summary_line(&spec).contains("(unrouted)"));
    }
}
