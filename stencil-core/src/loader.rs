//! Context loader: JSON / YAML data files into a [`Context`].
//!
//! The format is chosen strictly by extension:
//!
//! | Extension       | Parser       |
//! |-----------------|--------------|
//! | `.json`         | `serde_json` |
//! | `.yaml`, `.yml` | `serde_yaml` |
//!
//! Anything else is [`ContextError::UnsupportedFormat`].

use std::fmt;
use std::path::Path;

use crate::error::{ContextError, ParseDiagnostic};
use crate::value::{Context, Value};

/// Supported context document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFormat {
    Json,
    Yaml,
}

impl ContextFormat {
    /// Select the format from `path`'s extension.
    pub fn from_path(path: &Path) -> Result<Self, ContextError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(ContextFormat::Json),
            Some("yaml") | Some("yml") => Ok(ContextFormat::Yaml),
            _ => Err(ContextError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl fmt::Display for ContextFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextFormat::Json => f.write_str("JSON"),
            ContextFormat::Yaml => f.write_str("YAML"),
        }
    }
}

/// Parse `contents` (read from `path`) as a context document.
///
/// The document root must be a mapping or `null`. A YAML file holding no
/// document at all is the empty context.
pub fn parse(contents: &str, format: ContextFormat, path: &Path) -> Result<Context, ContextError> {
    let parse_err = |source: ParseDiagnostic| ContextError::Parse {
        path: path.to_path_buf(),
        format,
        source,
    };
    if format == ContextFormat::Yaml && contents.trim().is_empty() {
        return Ok(Context::new());
    }
    let value: Value = match format {
        ContextFormat::Json => serde_json::from_str(contents).map_err(|e| parse_err(e.into()))?,
        ContextFormat::Yaml => parse_yaml(contents).map_err(|e| parse_err(e.into()))?,
    };
    Context::try_from(value).map_err(|root| {
        parse_err(format!("document root must be a mapping, found {}", root.kind()).into())
    })
}

/// YAML with `<<` merge keys expanded.
fn parse_yaml(contents: &str) -> Result<Value, serde_yaml::Error> {
    let mut doc: serde_yaml::Value = serde_yaml::from_str(contents)?;
    doc.apply_merge()?;
    serde_yaml::from_value(doc)
}

/// Load a context file from `path`.
pub fn load_file(path: &Path) -> Result<Context, ContextError> {
    let format = ContextFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path).map_err(|source| ContextError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, format, path)
}

/// Load the base context. No path means rendering without external data.
pub fn load(path: Option<&Path>) -> Result<Context, ContextError> {
    match path {
        Some(path) => load_file(path),
        None => Ok(Context::new()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
