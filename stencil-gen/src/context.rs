//! Per-template context resolution.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::Path;

use stencil_core::{merge, Context, ContextError, ContextFormat, TemplateRef};

/// Load a local context file asynchronously.
///
/// A file that does not exist is the empty context. Any other read failure,
/// an unsupported extension or a parse error is returned.
pub async fn load_local_context(path: &Path) -> Result<Context, ContextError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("no local context at {}", path.display());
            return Ok(Context::new());
        }
        Err(source) => {
            return Err(ContextError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let format = ContextFormat::from_path(path)?;
    stencil_core::parse(&contents, format, path)
}

/// Effective context for `template`: `base` merged with the local context
/// found at `<template dir>/<relative>`, when a relative name is configured.
pub async fn effective_context<'a>(
    template: &TemplateRef,
    base: &'a Context,
    relative: Option<&Path>,
) -> Result<Cow<'a, Context>, ContextError> {
    let Some(relative) = relative else {
        return Ok(Cow::Borrowed(base));
    };
    let local_path = template.source_dir().join(relative);
    let local = load_local_context(&local_path).await?;
    if local.is_empty() {
        return Ok(Cow::Borrowed(base));
    }
    tracing::debug!("merging local context {} for `{}`", local_path.display(), template.key);
    Ok(Cow::Owned(merge(base, &local)))
}
