//! Conversion of a stencil [`Context`] into a [`tera::Context`].

use stencil_core::Context;

use crate::error::RenderError;

/// Convert to a [`tera::Context`] for rendering.
///
/// Every top-level key of `context` becomes a template variable.
pub fn to_tera_context(context: &Context) -> Result<tera::Context, RenderError> {
    tera::Context::from_serialize(context).map_err(RenderError::from)
}
