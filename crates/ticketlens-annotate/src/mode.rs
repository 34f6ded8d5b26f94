//! Output modes.
//!
//! A mode is a tag plus a table entry: the remote result field it reads and
//! the function projecting one (record, result) pair into an output row.
//! Everything else (batching, caching, remote calls) is shared.

use std::collections::HashMap;

use ticketlens_comprehend::Operation;
use ticketlens_core::{DominantLanguage, ENTITY_TYPES, Entity, Record, ResultItem};
use tracing::warn;

use crate::AnnotateError;

/// Header of the id column in every mode.
pub const ID_HEADER: &str = "Question Id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Entities,
    Languages,
}

/// Projects one record and its result into an output row, or `None` to
/// emit nothing for that record.
pub type Projection = fn(&Record, &ResultItem) -> Result<Option<Vec<String>>, AnnotateError>;

pub struct ModeSpec {
    /// Command-line name.
    pub name: &'static str,
    /// Field of each result item holding this mode's payload.
    pub result_field: &'static str,
    pub header: fn() -> Vec<String>,
    pub project: Projection,
}

static ENTITY_MODE: ModeSpec = ModeSpec {
    name: "detect-entities",
    result_field: "Entities",
    header: entity_header,
    project: project_entities,
};

static LANGUAGE_MODE: ModeSpec = ModeSpec {
    name: "detect-languages",
    result_field: "Languages",
    header: language_header,
    project: project_languages,
};

impl Mode {
    pub fn spec(self) -> &'static ModeSpec {
        match self {
            Self::Entities => &ENTITY_MODE,
            Self::Languages => &LANGUAGE_MODE,
        }
    }

    /// Remote operation backing this mode. `language_code` only applies to
    /// entity detection.
    pub fn operation(self, language_code: &str) -> Operation {
        match self {
            Self::Entities => Operation::DetectEntities {
                language_code: language_code.to_string(),
            },
            Self::Languages => Operation::DetectDominantLanguage,
        }
    }
}

fn payload<T: serde::de::DeserializeOwned>(
    record: &Record,
    item: &ResultItem,
    field: &str,
) -> Result<T, AnnotateError> {
    item.field(field).map_err(|source| AnnotateError::Field {
        id: record.id.clone(),
        line: record.line_number,
        source,
    })
}

// ── Entities ──

fn entity_header() -> Vec<String> {
    std::iter::once(ID_HEADER)
        .chain(ENTITY_TYPES)
        .map(str::to_string)
        .collect()
}

fn project_entities(
    record: &Record,
    item: &ResultItem,
) -> Result<Option<Vec<String>>, AnnotateError> {
    let entities: Vec<Entity> = payload(record, item, ENTITY_MODE.result_field)?;
    Ok(entity_row(&record.id, &entities))
}

/// `[id, PERSON, LOCATION, ..., OTHER]`, each category cell holding that
/// type's entity texts joined by `" + "`.
///
/// A record with no entities at all yields no row.
pub fn entity_row(id: &str, entities: &[Entity]) -> Option<Vec<String>> {
    if entities.is_empty() {
        return None;
    }

    let mut by_type: HashMap<&str, Vec<&str>> = HashMap::new();
    for entity in entities {
        by_type
            .entry(entity.entity_type.as_str())
            .or_default()
            .push(entity.text.as_str());
    }

    let mut row = Vec::with_capacity(ENTITY_TYPES.len() + 1);
    row.push(id.to_string());
    row.extend(
        ENTITY_TYPES
            .iter()
            .map(|t| by_type.get(t).map(|texts| texts.join(" + ")).unwrap_or_default()),
    );
    Some(row)
}

// ── Languages ──

fn language_header() -> Vec<String> {
    [ID_HEADER, "Language", "Score"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn project_languages(
    record: &Record,
    item: &ResultItem,
) -> Result<Option<Vec<String>>, AnnotateError> {
    let languages: Vec<DominantLanguage> = payload(record, item, LANGUAGE_MODE.result_field)?;

    if languages.len() > 1 {
        let candidates = languages
            .iter()
            .map(|l| format!("{}={}", l.language_code, format_score(l.score)))
            .collect::<Vec<_>>()
            .join(", ");
        warn!(
            id = %record.id,
            line = record.line_number,
            %candidates,
            "multiple languages detected"
        );
    }

    match best_language(&languages) {
        Some(best) => Ok(Some(vec![
            record.id.clone(),
            best.language_code.clone(),
            format_score(best.score),
        ])),
        None => {
            warn!(id = %record.id, line = record.line_number, "no language detected");
            Ok(None)
        }
    }
}

/// Score as written to the output: shortest round-trip form, always with a
/// fractional part or an exponent (`1.0`, `0.95`, `1e-5`).
pub fn format_score(score: f64) -> String {
    format!("{score:?}")
}

/// Highest-scoring candidate; the first one wins a tie.
pub fn best_language(languages: &[DominantLanguage]) -> Option<&DominantLanguage> {
    languages.iter().fold(None, |best, lang| match best {
        Some(b) if b.score >= lang.score => Some(b),
        _ => Some(lang),
    })
}
