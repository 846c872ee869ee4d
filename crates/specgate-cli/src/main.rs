//! # specgate CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use specgate_cli::check::{run_check, CheckArgs};
use specgate_cli::resolve::{run_resolve, ResolveArgs};
use specgate_cli::validate::{run_validate, ValidateArgs};

/// specgate: multi-spec OpenAPI request/response validation.
///
/// Checks validation configs, shows which spec governs a path, and
/// validates single requests without running the gateway.
#[derive(Parser, Debug)]
#[command(name = "specgate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile every enabled spec in a validation config.
    Check(CheckArgs),

    /// Show the spec governing a request path.
    Resolve(ResolveArgs),

    /// Validate one request against its governing spec.
    Validate(ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check(args) => run_check(&args),
        Commands::Resolve(args) => run_resolve(&args),
        Commands::Validate(args) => run_validate(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
