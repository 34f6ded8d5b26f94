use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("questions file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("error reading csv file on line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("malformed row on line {line}: expected {expected} columns, found {found}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("corrupt cache entry {key}: {source}")]
    CorruptEntry {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
