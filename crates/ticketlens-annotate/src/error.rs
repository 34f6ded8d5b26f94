use thiserror::Error;
use ticketlens_comprehend::ClientError;
use ticketlens_core::{FieldError, MAX_BATCH_SIZE};
use ticketlens_store::StoreError;

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("question {id} (line {line}): {source}")]
    Field {
        id: String,
        line: u64,
        #[source]
        source: FieldError,
    },

    #[error("batch size {0} is outside 1..={max}", max = MAX_BATCH_SIZE)]
    BatchSize(usize),

    #[error("text byte limit must be positive")]
    TextLimit,
}
