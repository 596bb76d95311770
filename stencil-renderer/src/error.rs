//! Error types for stencil-renderer.

use std::path::PathBuf;

use stencil_core::TemplateKey;
use thiserror::Error;

/// All errors that can arise from template loading and rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error (unknown template, missing variable, …).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while loading template sources.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template could not be rendered for a reason reported as text,
    /// e.g. it failed to parse when the renderer was built.
    #[error("failed to render `{key}`: {message}")]
    Failed { key: TemplateKey, message: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}
