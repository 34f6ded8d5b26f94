//! Storage layer: question CSV input, annotated CSV output, and the
//! content-addressed result cache.

mod error;
pub use error::StoreError;

pub mod cache;
pub mod input;
pub mod output;

pub use cache::{CacheBackend, CacheKey, CacheOutcome, CacheStore, FsBackend, MemoryBackend};
pub use input::{QuestionReader, read_questions};
pub use output::RowWriter;
