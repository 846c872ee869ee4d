//! # Resolve Subcommand
//!
//! Shows which spec governs a request path: longest route prefix first,
//! then the fallback.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

/// Arguments for `specgate resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Validation config (default: specs/validation.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Request path, e.g. /api/v1/user.
    #[arg(value_name = "REQUEST_PATH")]
    pub path: String,
}

/// Execute the resolve subcommand. Exit code 1 when no spec governs the path.
pub fn run_resolve(args: &ResolveArgs) -> Result<u8> {
    let (_, registry) = crate::load_registry(&crate::config_path(args.config.as_deref()))?;
    match registry.resolve(&args.path) {
        Ok(spec) => {
            let via = registry
                .routes()
                .into_iter()
                .find(|r| args.path.starts_with(r.prefix.as_str()))
                .map_or_else(|| "fallback".to_string(), |r| format!("prefix {}", r.prefix));
            println!("{} -> {} ({via})", args.path, spec.name());
            Ok(0)
        }
        Err(e) => {
            println!("{}: {e}", args.path);
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(path: &str) -> ResolveArgs {
        ResolveArgs {
            config: Some(crate::fixture_config()),
            path: path.to_string(),
        }
    }

    #[test]
    fn resolves_routed_path() {
        assert_eq!(run_resolve(&args("/api/v1/user/42")).unwrap(), 0);
    }

    #[test]
    fn unrouted_path_exits_1() {
        assert_eq!(run_resolve(&args("/metrics")).unwrap(), 1);
    }
}
