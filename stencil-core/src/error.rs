//! Error types for stencil-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::loader::ContextFormat;

/// Boxed parser diagnostic; JSON and YAML parsers report different error types.
pub type ParseDiagnostic = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors that can arise while loading a context file.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The file exists (or was expected to) but could not be read.
    #[error("failed to read context file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its contents are not a valid context document.
    #[error("failed to parse context file {path} as {format}: {source}")]
    Parse {
        path: PathBuf,
        format: ContextFormat,
        #[source]
        source: ParseDiagnostic,
    },

    /// The extension is not one of `.json`, `.yaml`, `.yml`.
    #[error("unsupported context file extension: {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },
}

/// Render `err` and every `source()` below it as `outer: inner: root`.
///
/// Wrapping errors such as `tera::Error` keep the useful detail in their
/// sources; this flattens them for one-line diagnostics.
pub fn display_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let msg = inner.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        source = inner.source();
    }
    out
}
