//! # stencil-renderer
//!
//! Tera-based template engine that renders discovered templates against a
//! merged data context.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use stencil_core::{Context, TemplateKey, TemplateRoot};
//! use stencil_renderer::{Renderer, RendererOptions, TeraRenderer};
//!
//! fn render_one() -> Result<String, stencil_renderer::RenderError> {
//!     let root = TemplateRoot::Directory(PathBuf::from("templates"));
//!     let renderer = TeraRenderer::new(&root, "edge", RendererOptions::default())?;
//!     renderer.render(&TemplateKey::from("notes/readme"), &Context::new())
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::to_tera_context;
pub use engine::{Renderer, RendererOptions, TeraRenderer};
pub use error::RenderError;
