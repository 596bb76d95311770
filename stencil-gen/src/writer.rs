//! Output writing.
//!
//! Write flow: `create_dir_all(parent)` → `<name>.<pid>.<n>.stencil.tmp`
//! sibling → `rename`. The temporary file lives next to the target so the
//! rename never crosses filesystems, and its name is unique per write so
//! concurrent writers of one path never share it. Existing files are
//! overwritten; the last rename wins.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{write_err, GenError};

/// What happened to one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    Written { path: PathBuf },
    /// Dry run: the file would have been written here.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path } | WriteResult::WouldWrite { path } => path,
        }
    }
}

/// Join `rel` onto `root` the way a path-joining utility does: absolute
/// prefixes and `.` segments are dropped, so the result stays under `root`
/// unless `rel` walks out with `..`.
pub fn resolve_output_path(root: &Path, rel: &Path) -> PathBuf {
    let mut out = root.to_path_buf();
    for component in rel.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => out.push(".."),
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Default output path of a single-output template: `<key>.<ext>`, or just
/// `<key>` when the extension is skipped.
pub fn single_output_path(root: &Path, key: &str, extension: Option<&str>) -> PathBuf {
    let rel = match extension.map(|e| e.trim_start_matches('.')) {
        Some(ext) if !ext.is_empty() => format!("{key}.{ext}"),
        _ => key.to_string(),
    };
    resolve_output_path(root, Path::new(&rel))
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn tmp_sibling(path: &Path) -> PathBuf {
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!(".{}.{n}.stencil.tmp", std::process::id()));
    path.with_file_name(name)
}

/// Write `content` to `path`, creating parent directories as needed.
///
/// With `dry_run` nothing touches the filesystem.
pub async fn write_output(
    source: &Path,
    path: PathBuf,
    content: &str,
    dry_run: bool,
) -> Result<WriteResult, GenError> {
    if dry_run {
        tracing::info!("[dry-run] {} -> {}", source.display(), path.display());
        return Ok(WriteResult::WouldWrite { path });
    }
    tracing::info!("Generating file: {} -> {}", source.display(), path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_err(parent, e))?;
    }

    let tmp = tmp_sibling(&path);
    tokio::fs::write(&tmp, content)
        .await
        .map_err(|e| write_err(&path, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, &path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_err(&path, e));
    }
    Ok(WriteResult::Written { path })
}
