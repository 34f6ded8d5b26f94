//! Core types for ticketlens: question records, annotation results, and the
//! pure text/batch/row helpers shared by every layer.

pub mod batch;
pub mod encode;
pub mod entity;
pub mod record;
pub mod result;
#[cfg(any(test, feature = "test-util"))]
pub mod test_support;
pub mod truncate;

pub use batch::{BatchExt, Batches, MAX_BATCH_SIZE};
pub use encode::encode_row;
pub use entity::{DominantLanguage, ENTITY_TYPES, Entity};
pub use record::{QUESTION_COLUMNS, Record};
pub use result::{ApiResult, BatchItemError, FieldError, ResultItem};
pub use truncate::{MAX_TEXT_BYTES, truncate_utf8, truncated_text};
