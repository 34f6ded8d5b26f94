//! Support-ticket question records parsed from the input file.

/// Columns in a question row: id, queue name, ticket source, subject, text.
pub const QUESTION_COLUMNS: usize = 5;

/// One question row.
///
/// `line_number` is the 1-based line of the row in the input file and is
/// carried only for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub queue_name: String,
    pub ticket_source: String,
    pub subject: String,
    pub text: String,
    pub line_number: u64,
}

impl Record {
    /// Build a record from the five columns of an input row, in file order.
    pub fn from_row(line_number: u64, row: [String; QUESTION_COLUMNS]) -> Self {
        let [id, queue_name, ticket_source, subject, text] = row;
        Self {
            id,
            queue_name,
            ticket_source,
            subject,
            text,
            line_number,
        }
    }

    /// Whether the record has any text to annotate.
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_row_keeps_column_order() {
        let record = Record::from_row(
            7,
            [
                "q-1".into(),
                "billing".into(),
                "email".into(),
                "Refund".into(),
                "Where is my refund?".into(),
            ],
        );
        assert_eq!(record.id, "q-1");
        assert_eq!(record.queue_name, "billing");
        assert_eq!(record.ticket_source, "email");
        assert_eq!(record.subject, "Refund");
        assert_eq!(record.text, "Where is my refund?");
        assert_eq!(record.line_number, 7);
        assert!(record.has_text());
    }

    #[test]
    fn empty_text_has_no_text() {
        let record = Record::from_row(
            1,
            ["q-2".into(), "".into(), "".into(), "".into(), "".into()],
        );
        assert!(!record.has_text());
    }
}
