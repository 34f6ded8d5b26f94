//! Batch annotation results, in the remote service's wire shape.
//!
//! The same shape is written to the result cache, so a cached entry and a
//! fresh response are read through one deserialization path.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Result of one batch call, positionally aligned to the batch that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResult {
    #[serde(default)]
    pub result_list: Vec<ResultItem>,
    #[serde(default)]
    pub error_list: Vec<BatchItemError>,
}

/// Per-text result. The payload field (`Entities`, `Languages`) depends on
/// which operation produced it, so it is kept untyped until a mode asks for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(rename = "Index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A per-item failure reported by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BatchItemError {
    pub index: usize,
    pub error_code: String,
    pub error_message: String,
}

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("result item has no `{0}` field")]
    Missing(String),

    #[error("invalid `{field}` field: {source}")]
    Invalid {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ResultItem {
    /// Decode the named payload field.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<T, FieldError> {
        let value = self
            .fields
            .get(name)
            .ok_or_else(|| FieldError::Missing(name.to_string()))?;
        T::deserialize(value).map_err(|source| FieldError::Invalid {
            field: name.to_string(),
            source,
        })
    }
}
