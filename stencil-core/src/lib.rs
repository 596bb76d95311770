//! Stencil core library: the context data model with its loader and merge, plus the
//! shared template types.
//!
//! Public API surface:
//! - [`value`]: [`Value`], [`Number`], [`Context`] and the recursive [`merge`]
//! - [`loader`]: read a JSON / YAML data file into a [`Context`]
//! - [`types`]: [`TemplateRef`], [`TemplateRoot`], [`MultiFileEntry`]
//! - [`error`]: [`ContextError`]

pub mod error;
pub mod loader;
pub mod types;
pub mod value;

pub use error::{display_chain, ContextError};
pub use loader::{load, load_file, parse, ContextFormat};
pub use types::{MultiFileEntry, TemplateKey, TemplateKind, TemplateRef, TemplateRoot};
pub use value::{merge, Context, Mapping, Number, Value};
