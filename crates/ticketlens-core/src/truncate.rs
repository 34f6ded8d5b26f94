//! Byte-bounded text truncation that never splits a UTF-8 character.
//!
//! The remote service rejects texts above its per-document byte limit, so
//! oversized question text is trimmed from the end before it is sent.

use tracing::warn;

use crate::record::Record;

/// Per-text byte limit of the annotation service.
pub const MAX_TEXT_BYTES: usize = 5000;

/// Longest prefix of `text` that is at most `max_bytes` long and ends on a
/// character boundary.
pub fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// The part of `record.text` that fits in `max_bytes`. The record itself is
/// left untouched.
///
/// Logs the original and trimmed sizes when the text actually had to be
/// shortened.
pub fn truncated_text(record: &Record, max_bytes: usize) -> &str {
    let text = truncate_utf8(&record.text, max_bytes);
    if text.len() != record.text.len() {
        warn!(
            id = %record.id,
            line = record.line_number,
            original_bytes = record.text.len(),
            trimmed_bytes = text.len(),
            "truncated question text"
        );
    }
    text
}
