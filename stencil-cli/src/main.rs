//! Stencil: batch template generator.
//!
//! # Usage
//!
//! ```text
//! stencil -i templates -o out [-c context.yaml] [--relativeContextPath data.json]
//!         [--inputExtension edge] [--outputExtension html] [--skipOutputExtension]
//!         [--skipEscaping] [--concurrency 5] [--dry-run] [-q | -v]
//! ```

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use commands::generate::GenerateArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stencil",
    version,
    about = "Render a tree of templates against JSON/YAML data into output files",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    generate: GenerateArgs,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log skipped files and context resolution.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(quiet: bool, verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match (quiet, verbose) {
        (true, _) => "warn",
        (_, true) => "debug",
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    cli.generate.run()
}
