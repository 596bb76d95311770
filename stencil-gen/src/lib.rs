//! Stencil generation pipeline.
//!
//! - [`pipeline`]: [`run`] / [`generate_all`]: bounded fan-out over
//!   discovered templates with per-template fault isolation
//! - [`context`]: local context lookup and merge onto the base context
//! - [`splitter`]: the `<file path="…">` multi-output format
//! - [`writer`]: output path resolution and file writing
//! - [`error`]: [`GenError`], [`FailureRecord`]

pub mod context;
pub mod error;
pub mod pipeline;
pub mod splitter;
pub mod writer;

pub use context::{effective_context, load_local_context};
pub use error::{FailureRecord, GenError};
pub use pipeline::{
    generate_all, run, written_paths, GenerateOptions, GenerateReport, DEFAULT_CONCURRENCY,
    DEFAULT_OUTPUT_EXTENSION,
};
pub use splitter::{dedent, is_attr_true, split, SplitError};
pub use writer::{resolve_output_path, single_output_path, write_output, WriteResult};
