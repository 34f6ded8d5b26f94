//! Annotation payloads returned per text by the remote service.

use serde::{Deserialize, Serialize};

/// Entity categories, in output column order.
pub const ENTITY_TYPES: [&str; 9] = [
    "PERSON",
    "LOCATION",
    "ORGANIZATION",
    "COMMERCIAL_ITEM",
    "EVENT",
    "DATE",
    "QUANTITY",
    "TITLE",
    "OTHER",
];

/// A named entity detected in one text.
///
/// `entity_type` is kept as the raw service string so unknown categories
/// survive a cache round trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Entity {
    #[serde(rename = "Type")]
    pub entity_type: String,
    pub text: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<i64>,
}

/// A candidate dominant language for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DominantLanguage {
    pub language_code: String,
    pub score: f64,
}
