//! Annotation layer: output modes and the batch/cache/remote pipeline that
//! turns question records into annotated rows.

mod error;
pub use error::AnnotateError;

pub mod mode;
pub mod pipeline;

pub use mode::{Mode, ModeSpec, best_language, entity_row, format_score};
pub use pipeline::{Limits, Pipeline, RunState, RunSummary};
