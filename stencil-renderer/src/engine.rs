//! Tera rendering engine: the [`Renderer`] seam and [`TeraRenderer`].
//!
//! # Template registry
//!
//! | Root                          | Registered templates                                   |
//! |-------------------------------|--------------------------------------------------------|
//! | `TemplateRoot::Directory(d)`  | every `*.<ext>` under `d`, `_partials` included, keyed by relative path without extension |
//! | `TemplateRoot::File { .. }`   | the one file, under its key                            |
//!
//! Dot-prefixed files and directories are never registered.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use stencil_core::{display_chain, Context, TemplateKey, TemplateRoot};
use tera::{Template, Tera};

use crate::context::to_tera_context;
use crate::error::{io_err, RenderError};

// ---------------------------------------------------------------------------
// Renderer trait
// ---------------------------------------------------------------------------

/// Renders one template, identified by key, against a context.
///
/// Implementations must be shareable across concurrently running generations.
pub trait Renderer: Send + Sync {
    fn render(&self, key: &TemplateKey, context: &Context) -> Result<String, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&TemplateKey, &Context) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, key: &TemplateKey, context: &Context) -> Result<String, RenderError> {
        self(key, context)
    }
}

/// Construction-time rendering behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererOptions {
    /// HTML-escape interpolated values (`{{ value }}`). `| safe` opts out per value.
    pub escape_output: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self { escape_output: true }
    }
}

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .collect::<Result<_, _>>()
        .map_err(|e| io_err(dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let meta = fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// Template sources that could be read, and a diagnostic for every key that
/// could not (or that later turns out to be unloadable).
type Sources = (Vec<(String, String)>, HashMap<String, String>);

fn read_source(path: &Path, name: String, sources: &mut Sources) {
    match fs::read_to_string(path) {
        Ok(contents) => sources.0.push((name, contents)),
        Err(e) => {
            sources.1.insert(name, format!("cannot read {}: {e}", path.display()));
        }
    }
}

fn load_directory_templates(dir: &Path, extension: &str) -> Result<Sources, RenderError> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;

    let mut sources: Sources = (Vec::new(), HashMap::new());
    for path in files {
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let Some(rel_str) = rel.to_str() else { continue };
        let Some(stem) = rel_str.strip_suffix(&suffix) else { continue };
        if stem.is_empty() {
            continue;
        }
        let name = TemplateKey::from_relative(Path::new(stem)).0;
        read_source(&path, name, &mut sources);
    }
    Ok(sources)
}

fn load_templates(root: &TemplateRoot, extension: &str) -> Result<Sources, RenderError> {
    match root {
        TemplateRoot::Directory(dir) => load_directory_templates(dir, extension),
        TemplateRoot::File { path, key } => {
            let mut sources: Sources = (Vec::new(), HashMap::new());
            read_source(path, key.0.clone(), &mut sources);
            Ok(sources)
        }
    }
}

struct Parsed {
    name: String,
    source: String,
    parent: Option<String>,
    imports: Vec<String>,
}

/// Names whose `extends` chain loops back on itself, directly or further up.
fn circular_extends(parsed: &[Parsed]) -> Vec<String> {
    let parents: HashMap<&str, &str> = parsed
        .iter()
        .filter_map(|p| p.parent.as_deref().map(|parent| (p.name.as_str(), parent)))
        .collect();

    let mut cyclic = Vec::new();
    for p in parsed {
        let mut seen = HashSet::from([p.name.as_str()]);
        let mut current = p.name.as_str();
        while let Some(&parent) = parents.get(current) {
            if !seen.insert(parent) {
                cyclic.push(p.name.clone());
                break;
            }
            current = parent;
        }
    }
    cyclic
}

/// Split sources into those tera can load and those it cannot.
///
/// A template is unloadable if it failed to read or parse, if its `extends`
/// chain is circular, or if it extends or imports macros from a template that
/// is missing or itself unloadable. Returns `(loadable, broken)`.
fn partition_loadable((sources, mut broken): Sources) -> Sources {
    let mut parsed = Vec::with_capacity(sources.len());
    for (name, source) in sources {
        match Template::new(&name, None, &source) {
            Ok(tpl) => parsed.push(Parsed {
                parent: tpl.parent,
                imports: tpl.imported_macro_files.into_iter().map(|(file, _)| file).collect(),
                name,
                source,
            }),
            Err(e) => {
                broken.insert(name, display_chain(&e));
            }
        }
    }

    let cyclic = circular_extends(&parsed);
    parsed.retain(|p| !cyclic.contains(&p.name));
    for name in cyclic {
        broken.insert(name, "circular `extends` chain".to_string());
    }

    loop {
        let names: HashSet<String> = parsed.iter().map(|p| p.name.clone()).collect();
        let before = parsed.len();
        parsed.retain(|p| {
            if let Some(parent) = p.parent.as_ref().filter(|parent| !names.contains(*parent)) {
                broken.insert(
                    p.name.clone(),
                    format!("extends `{parent}`, which is missing or failed to load"),
                );
                return false;
            }
            if let Some(import) = p.imports.iter().find(|import| !names.contains(*import)) {
                broken.insert(
                    p.name.clone(),
                    format!("imports macros from `{import}`, which is missing or failed to load"),
                );
                return false;
            }
            true
        });
        if parsed.len() == before {
            break;
        }
    }

    let loadable = parsed.into_iter().map(|p| (p.name, p.source)).collect();
    (loadable, broken)
}

fn build_tera(sources: Sources, options: RendererOptions) -> Result<(Tera, HashMap<String, String>), RenderError> {
    let (loadable, broken) = partition_loadable(sources);
    for (name, message) in &broken {
        tracing::warn!("template `{name}` failed to load: {message}");
    }

    let mut tera = Tera::default();
    if options.escape_output {
        // Every registered name ends with "".
        tera.autoescape_on(vec![""]);
    } else {
        tera.autoescape_on(vec![]);
    }
    tera.add_raw_templates(loadable)?;
    Ok((tera, broken))
}

// ---------------------------------------------------------------------------
// TeraRenderer
// ---------------------------------------------------------------------------

/// Tera-backed [`Renderer`] over a [`TemplateRoot`].
///
/// Templates that fail to load do not fail construction; rendering them
/// returns [`RenderError::Failed`] with the load diagnostic, so one broken
/// template only affects its own generation.
pub struct TeraRenderer {
    tera: Tera,
    broken: HashMap<String, String>,
}

impl TeraRenderer {
    /// Load every template reachable from `root` (files named `*.<extension>`
    /// in directory mode).
    pub fn new(root: &TemplateRoot, extension: &str, options: RendererOptions) -> Result<Self, RenderError> {
        let sources = load_templates(root, extension)?;
        let (tera, broken) = build_tera(sources, options)?;
        Ok(TeraRenderer { tera, broken })
    }

    /// Build from in-memory `(key, source)` pairs.
    pub fn from_sources<I, K, S>(sources: I, options: RendererOptions) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<String>,
    {
        let sources = sources.into_iter().map(|(k, s)| (k.into(), s.into())).collect();
        let (tera, broken) = build_tera((sources, HashMap::new()), options)?;
        Ok(TeraRenderer { tera, broken })
    }

    /// Keys of every successfully loaded template, sorted.
    pub fn template_keys(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, key: &TemplateKey, context: &Context) -> Result<String, RenderError> {
        if let Some(message) = self.broken.get(key.as_str()) {
            return Err(RenderError::Failed {
                key: key.clone(),
                message: message.clone(),
            });
        }
        let ctx = to_tera_context(context)?;
        Ok(self.tera.render(key.as_str(), &ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
