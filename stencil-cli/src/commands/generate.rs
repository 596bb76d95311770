//! `stencil`: discover and render every template, then write the outputs.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use stencil_gen::{GenError, GenerateOptions, GenerateReport, WriteResult};

/// Generation flags. Long names are camelCase with kebab-case aliases.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Template file or directory of templates.
    #[arg(short = 'i', long = "inputPath", visible_alias = "input-path", default_value = ".")]
    pub input_path: PathBuf,

    /// Root directory every output is written under.
    #[arg(short = 'o', long = "outputPath", visible_alias = "output-path", default_value = ".")]
    pub output_path: PathBuf,

    /// Base context file (.json, .yaml or .yml).
    #[arg(short = 'c', long = "contextPath", visible_alias = "context-path")]
    pub context_path: Option<PathBuf>,

    /// Local context file name, looked up next to each template.
    #[arg(long = "relativeContextPath", visible_alias = "relative-context-path")]
    pub relative_context_path: Option<PathBuf>,

    /// Extension of template files.
    #[arg(long = "inputExtension", visible_alias = "input-extension", default_value = stencil_discover::DEFAULT_EXTENSION)]
    pub input_extension: String,

    /// Extension appended to single-output files.
    #[arg(long = "outputExtension", visible_alias = "output-extension", default_value = stencil_gen::DEFAULT_OUTPUT_EXTENSION)]
    pub output_extension: String,

    /// Write single-output files as `<key>` with no extension.
    #[arg(long = "skipOutputExtension", visible_alias = "skip-output-extension")]
    pub skip_output_extension: bool,

    /// Do not HTML-escape interpolated values.
    #[arg(long = "skipEscaping", visible_alias = "skip-escaping")]
    pub skip_escaping: bool,

    /// Maximum number of templates generated at once.
    #[arg(long, default_value = "5")]
    pub concurrency: NonZeroUsize,

    /// Show what would be written without writing any files.
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateArgs {
    pub fn options(&self) -> GenerateOptions {
        GenerateOptions {
            input_path: self.input_path.clone(),
            output_path: self.output_path.clone(),
            context_path: self.context_path.clone(),
            relative_context_path: self.relative_context_path.clone(),
            input_extension: self.input_extension.clone(),
            output_extension: self.output_extension.clone(),
            skip_output_extension: self.skip_output_extension,
            escape_output: !self.skip_escaping,
            concurrency: self.concurrency.get(),
            dry_run: self.dry_run,
        }
    }

    pub fn run(self) -> Result<ExitCode> {
        let options = self.options();
        tracing::debug!("{options:?}");
        // One thread; generations interleave at I/O boundaries.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;

        match runtime.block_on(stencil_gen::run(&options)) {
            Ok(report) => {
                print_report(&report, options.dry_run);
                Ok(ExitCode::SUCCESS)
            }
            Err(err @ GenError::Batch { .. }) => {
                eprintln!("{}", format!("✗ {err}").red().bold());
                Ok(ExitCode::FAILURE)
            }
            Err(err) => Err(err).with_context(|| {
                format!("generation from {} failed", options.input_path.display())
            }),
        }
    }
}

fn print_report(report: &GenerateReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let summary = format!(
        "{prefix}✓ {} file(s) generated from {} template(s)",
        report.writes.len(),
        report.templates
    );
    println!("{}", summary.green());

    if dry_run {
        for r in &report.writes {
            if let WriteResult::WouldWrite { path } = r {
                println!("  ~  {}", path.display());
            }
        }
    }
}
