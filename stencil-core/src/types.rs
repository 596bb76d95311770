//! Shared template types passed between discovery, rendering and generation.
//!
//! All path fields use `PathBuf`; template keys are always `/`-separated.

use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// TemplateKey
// ---------------------------------------------------------------------------

/// Extension-stripped, root-relative identifier of a template.
///
/// Used both to look the template up in the renderer and as the stem of its
/// default output path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateKey(pub String);

impl TemplateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build a key from a relative path with its extension already stripped.
    ///
    /// Separators are normalised to `/` so keys are identical across platforms.
    pub fn from_relative(path: &Path) -> Self {
        let joined = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TemplateKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TemplateKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// TemplateRef
// ---------------------------------------------------------------------------

/// Whether a template writes one file or encodes several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Rendered text is written verbatim to `<key>[.<ext>]`.
    Single,
    /// Rendered text is a `<file path="…">` document split into many files.
    Multi,
}

/// One discovered template. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    pub key: TemplateKey,
    /// The path the template was discovered at, as reported to the user.
    pub source_path: PathBuf,
    pub kind: TemplateKind,
}

impl TemplateRef {
    pub fn is_multi(&self) -> bool {
        self.kind == TemplateKind::Multi
    }

    /// Directory containing the template source; local context files are
    /// resolved relative to it.
    pub fn source_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new(""))
    }
}

// ---------------------------------------------------------------------------
// TemplateRoot
// ---------------------------------------------------------------------------

/// Where the renderer finds template sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRoot {
    /// Every template under this directory is resolvable by key.
    Directory(PathBuf),
    /// A single template file, resolvable only under `key`.
    File { path: PathBuf, key: TemplateKey },
}

// ---------------------------------------------------------------------------
// MultiFileEntry
// ---------------------------------------------------------------------------

/// One output file extracted from a multi-output document.
///
/// `content` already has `dedent` / `trim` applied; the flags are kept for
/// reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiFileEntry {
    pub output_path: PathBuf,
    pub content: String,
    pub dedent: bool,
    pub trim: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_from_nested_relative_path_uses_forward_slashes() {
        let key = TemplateKey::from_relative(&Path::new("notes").join("sub").join("readme"));
        assert_eq!(key.as_str(), "notes/sub/readme");
    }

    #[test]
    fn source_dir_of_bare_file_is_empty() {
        let t = TemplateRef {
            key: TemplateKey::from("a"),
            source_path: PathBuf::from("a.edge"),
            kind: TemplateKind::Single,
        };
        assert_eq!(t.source_dir(), Path::new(""));
        assert!(!t.is_multi());
    }
}
