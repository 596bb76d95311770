//! Error types for stencil-gen.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use stencil_core::{ContextError, TemplateKey};
use stencil_discover::DiscoverError;
use stencil_renderer::RenderError;

use crate::splitter::SplitError;

/// All errors that can arise from a generation run.
#[derive(Debug, Error)]
pub enum GenError {
    /// Discovery failed; fatal to the run.
    #[error("discovery error: {0}")]
    Discover(#[from] DiscoverError),

    /// A base or local context file could not be loaded.
    #[error("context error: {0}")]
    Context(#[from] ContextError),

    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// A multi-output template rendered text that is not a `<file>` document.
    #[error("malformed multi-output document from {source_path}: {source}")]
    MalformedMultiOutput {
        source_path: PathBuf,
        #[source]
        source: SplitError,
    },

    /// An output file or one of its parent directories could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more templates failed; every failed key is listed.
    #[error("failed to generate: {}", FailedKeys(.failures))]
    Batch { failures: Vec<FailureRecord> },
}

/// A template whose generation failed, and why.
#[derive(Debug)]
pub struct FailureRecord {
    pub key: TemplateKey,
    pub cause: GenError,
}

struct FailedKeys<'a>(&'a [FailureRecord]);

impl fmt::Display for FailedKeys<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", failure.key)?;
        }
        Ok(())
    }
}

/// Convenience constructor for [`GenError::Write`].
pub(crate) fn write_err(path: impl Into<PathBuf>, source: std::io::Error) -> GenError {
    GenError::Write {
        path: path.into(),
        source,
    }
}
