//! Template discovery for `stencil-discover`.
//!
//! `discover(input, extension)` turns an input location into the list of
//! templates to generate. A single file yields exactly one single-output
//! template. A directory is walked recursively: every file named
//! `*.<extension>` becomes a template keyed by its relative path without the
//! extension, except files under (or named with) a `.` or `_` prefix.
//! Keys ending in `.multi` mark multi-output templates.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use stencil_core::{TemplateKey, TemplateKind, TemplateRef, TemplateRoot};
use thiserror::Error;

/// Extension matched when none is configured.
pub const DEFAULT_EXTENSION: &str = "edge";

const MULTI_SUFFIX: &str = ".multi";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Result of a successful discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    /// Lookup root the renderer must be built from before any render call.
    pub root: TemplateRoot,
    /// Templates in deterministic (sorted path) order. Never empty.
    pub templates: Vec<TemplateRef>,
}

/// Errors from template discovery. All of them abort the run.
#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("expected input to be a file or directory: {path}")]
    InvalidInput { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no templates could be found in {path} (looking for *.{extension})")]
    NoInput { path: PathBuf, extension: String },

    #[error("duplicate template key `{key}`: {first} and {second} would write the same output")]
    DuplicateKey {
        key: TemplateKey,
        first: PathBuf,
        second: PathBuf,
    },
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DiscoverError {
    DiscoverError::Io {
        path: path.into(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Discover templates at `input` matching `extension` (with or without a
/// leading dot).
pub fn discover(input: &Path, extension: &str) -> Result<Discovered, DiscoverError> {
    let extension = extension.trim_start_matches('.');
    let meta = match fs::metadata(input) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DiscoverError::InvalidInput { path: input.to_path_buf() });
        }
        Err(e) => return Err(io_err(input, e)),
    };

    if meta.is_file() {
        return Ok(discover_file(input));
    }
    if meta.is_dir() {
        return discover_dir(input, extension);
    }
    Err(DiscoverError::InvalidInput { path: input.to_path_buf() })
}

/// `true` if `name` is excluded from discovery (`.hidden`, `_partial`).
pub fn is_ignored_name(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

// ---------------------------------------------------------------------------
// Single file
// ---------------------------------------------------------------------------

fn discover_file(path: &Path) -> Discovered {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let key = TemplateKey::from(stem);
    tracing::debug!("single template {} -> key `{key}`", path.display());

    Discovered {
        root: TemplateRoot::File {
            path: path.to_path_buf(),
            key: key.clone(),
        },
        // Single-file mode never produces multi-output templates.
        templates: vec![TemplateRef {
            key,
            source_path: path.to_path_buf(),
            kind: TemplateKind::Single,
        }],
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

fn discover_dir(root: &Path, extension: &str) -> Result<Discovered, DiscoverError> {
    let suffix = format!(".{extension}");
    let mut matches = Vec::new();
    collect_matches(root, Path::new(""), &suffix, &mut matches)?;

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut templates = Vec::with_capacity(matches.len());
    for (rel_dir, stem) in matches {
        let key = TemplateKey::from_relative(&rel_dir.join(&stem));
        let source_path = root.join(&rel_dir).join(format!("{stem}{suffix}"));

        if let Some(first) = seen.insert(key.as_str().to_ascii_lowercase(), source_path.clone()) {
            return Err(DiscoverError::DuplicateKey {
                key,
                first,
                second: source_path,
            });
        }

        let kind = if key.as_str().ends_with(MULTI_SUFFIX) {
            TemplateKind::Multi
        } else {
            TemplateKind::Single
        };
        tracing::debug!("found template {} -> key `{key}` ({kind:?})", source_path.display());
        templates.push(TemplateRef {
            key,
            source_path,
            kind,
        });
    }

    if templates.is_empty() {
        return Err(DiscoverError::NoInput {
            path: root.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    Ok(Discovered {
        root: TemplateRoot::Directory(root.to_path_buf()),
        templates,
    })
}

/// Walk `root/rel`, pushing `(relative dir, file stem)` for every file whose
/// name ends in `suffix`. Entries are visited in sorted order; ignored names
/// are pruned, directories included.
fn collect_matches(
    root: &Path,
    rel: &Path,
    suffix: &str,
    out: &mut Vec<(PathBuf, String)>,
) -> Result<(), DiscoverError> {
    let dir = root.join(rel);
    let mut entries: Vec<_> = fs::read_dir(&dir)
        .map_err(|e| io_err(&dir, e))?
        .collect::<Result<_, _>>()
        .map_err(|e| io_err(&dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if is_ignored_name(&name) {
            tracing::debug!("ignored: {}", path.display());
            continue;
        }

        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            collect_matches(root, &rel.join(&name), suffix, out)?;
            continue;
        }
        // Symlinked files are followed; symlinked directories are not.
        let is_file = file_type.is_file()
            || (file_type.is_symlink() && fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false));
        if !is_file {
            continue;
        }

        if let Some(stem) = name.strip_suffix(suffix) {
            if !stem.is_empty() {
                out.push((rel.to_path_buf(), stem.to_string()));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
