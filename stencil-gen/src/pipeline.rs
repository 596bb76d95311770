//! Batch orchestration: one independent generation per template, run over a
//! bounded concurrency window, with every failure recorded rather than
//! aborting the batch.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use stencil_core::{display_chain, Context, TemplateRef};
use stencil_discover::{discover, DEFAULT_EXTENSION};
use stencil_renderer::{Renderer, RendererOptions, TeraRenderer};

use crate::context::effective_context;
use crate::error::{FailureRecord, GenError};
use crate::splitter::split;
use crate::writer::{resolve_output_path, single_output_path, write_output, WriteResult};

/// Templates generated at once unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Output extension used when none is configured.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "html";

// ---------------------------------------------------------------------------
// Options / report
// ---------------------------------------------------------------------------

/// Everything a generation run is configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// A template file or a directory of templates.
    pub input_path: PathBuf,
    /// Root every output path is resolved under.
    pub output_path: PathBuf,
    /// Base context file (JSON/YAML), loaded once.
    pub context_path: Option<PathBuf>,
    /// Local context file name, resolved against each template's directory.
    pub relative_context_path: Option<PathBuf>,
    pub input_extension: String,
    pub output_extension: String,
    pub skip_output_extension: bool,
    pub escape_output: bool,
    pub concurrency: usize,
    pub dry_run: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("."),
            output_path: PathBuf::from("."),
            context_path: None,
            relative_context_path: None,
            input_extension: DEFAULT_EXTENSION.to_string(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            skip_output_extension: false,
            escape_output: true,
            concurrency: DEFAULT_CONCURRENCY,
            dry_run: false,
        }
    }
}

impl GenerateOptions {
    fn output_extension(&self) -> Option<&str> {
        (!self.skip_output_extension).then_some(self.output_extension.as_str())
    }
}

/// Outcome of a fully successful run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerateReport {
    /// Number of templates processed.
    pub templates: usize,
    /// Every output, in template input order then document order.
    pub writes: Vec<WriteResult>,
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Discover, load the base context, build the renderer and generate every
/// template. Discovery and base-context failures abort before any rendering.
pub async fn run(options: &GenerateOptions) -> Result<GenerateReport, GenError> {
    let discovered = discover(&options.input_path, &options.input_extension)?;
    tracing::debug!(
        "discovered {} template(s) in {}",
        discovered.templates.len(),
        options.input_path.display()
    );

    let base = stencil_core::load(options.context_path.as_deref())?;
    let renderer = TeraRenderer::new(
        &discovered.root,
        &options.input_extension,
        RendererOptions {
            escape_output: options.escape_output,
        },
    )?;

    generate_all(&discovered.templates, &base, &renderer, options).await
}

/// Generate every template against `base` with at most
/// `options.concurrency` generations in flight.
///
/// A failing template never stops its siblings. If any failed, the result is
/// [`GenError::Batch`] listing them in input order.
pub async fn generate_all<R>(
    templates: &[TemplateRef],
    base: &Context,
    renderer: &R,
    options: &GenerateOptions,
) -> Result<GenerateReport, GenError>
where
    R: Renderer + ?Sized,
{
    let mut outcomes: Vec<_> = stream::iter(templates.iter().enumerate())
        .map(|(index, template)| async move {
            let outcome = generate_one(template, base, renderer, options).await;
            if let Err(err) = &outcome {
                tracing::error!("failed to generate `{}`: {}", template.key, display_chain(err));
            }
            (index, template, outcome)
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;
    // Completion order varies; report in input order.
    outcomes.sort_unstable_by_key(|(index, _, _)| *index);

    let mut report = GenerateReport {
        templates: templates.len(),
        writes: Vec::new(),
    };
    let mut failures = Vec::new();
    for (_, template, outcome) in outcomes {
        match outcome {
            Ok(writes) => report.writes.extend(writes),
            Err(cause) => failures.push(FailureRecord {
                key: template.key.clone(),
                cause,
            }),
        }
    }

    if failures.is_empty() {
        Ok(report)
    } else {
        Err(GenError::Batch { failures })
    }
}

async fn generate_one<R>(
    template: &TemplateRef,
    base: &Context,
    renderer: &R,
    options: &GenerateOptions,
) -> Result<Vec<WriteResult>, GenError>
where
    R: Renderer + ?Sized,
{
    let context = effective_context(template, base, options.relative_context_path.as_deref()).await?;
    let rendered = renderer.render(&template.key, &context)?;

    if !template.is_multi() {
        let path = single_output_path(
            &options.output_path,
            template.key.as_str(),
            options.output_extension(),
        );
        let result = write_output(&template.source_path, path, &rendered, options.dry_run).await?;
        return Ok(vec![result]);
    }

    write_multi(template, &rendered, options).await
}

/// Split a multi-output document and write every entry. A failed write does
/// not stop the remaining entries; the first failure is returned.
async fn write_multi(
    template: &TemplateRef,
    rendered: &str,
    options: &GenerateOptions,
) -> Result<Vec<WriteResult>, GenError> {
    let entries = split(rendered).map_err(|source| GenError::MalformedMultiOutput {
        source_path: template.source_path.clone(),
        source,
    })?;
    if entries.is_empty() {
        tracing::warn!(
            "{} rendered an empty multi-output document; nothing written",
            template.source_path.display()
        );
    }

    let mut writes = Vec::with_capacity(entries.len());
    let mut first_err = None;
    for entry in entries {
        let path = resolve_output_path(&options.output_path, &entry.output_path);
        match write_output(&template.source_path, path, &entry.content, options.dry_run).await {
            Ok(result) => writes.push(result),
            Err(err) => {
                tracing::error!("{}", display_chain(&err));
                first_err.get_or_insert(err);
            }
        }
    }

    match first_err {
        Some(err) => Err(err),
        None => Ok(writes),
    }
}

/// Paths from a report, for display.
pub fn written_paths(report: &GenerateReport) -> impl Iterator<Item = &Path> {
    report.writes.iter().map(WriteResult::path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
