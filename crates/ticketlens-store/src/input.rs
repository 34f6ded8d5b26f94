//! Question CSV reader.
//!
//! Rows are yielded lazily as [`Record`]s. The file has no implicit header;
//! callers opt into skipping the first row. Any structural problem is fatal:
//! the iterator yields the error and then stops.
//!
//! Blank lines are not rows. The csv reader drops them before they reach
//! the column check, so they are skipped rather than reported as malformed.
//! The header skip applies to the first non-blank row.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ticketlens_core::{QUESTION_COLUMNS, Record};

use crate::StoreError;

/// Open `path` and stream its question rows.
pub fn read_questions(path: &Path, skip_header: bool) -> Result<QuestionReader<File>, StoreError> {
    if !path.exists() {
        return Err(StoreError::InputNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    Ok(QuestionReader::new(file, skip_header))
}

pub struct QuestionReader<R: Read> {
    rows: csv::StringRecordsIntoIter<R>,
    skip_header: bool,
    failed: bool,
}

impl<R: Read> QuestionReader<R> {
    pub fn new(reader: R, skip_header: bool) -> Self {
        let rows = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();
        Self {
            rows,
            skip_header,
            failed: false,
        }
    }

    fn fail(&mut self, err: StoreError) -> Option<Result<Record, StoreError>> {
        self.failed = true;
        Some(Err(err))
    }
}

impl<R: Read> Iterator for QuestionReader<R> {
    type Item = Result<Record, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(source) => {
                    let line = source.position().map(|p| p.line()).unwrap_or(0);
                    return self.fail(StoreError::Csv { line, source });
                }
            };

            if self.skip_header {
                self.skip_header = false;
                continue;
            }

            let line = row.position().map(|p| p.line()).unwrap_or(0);
            if row.len() != QUESTION_COLUMNS {
                return self.fail(StoreError::MalformedRow {
                    line,
                    expected: QUESTION_COLUMNS,
                    found: row.len(),
                });
            }

            let fields: [String; QUESTION_COLUMNS] = std::array::from_fn(|i| row[i].to_string());
            return Some(Ok(Record::from_row(line, fields)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(data: &str, skip_header: bool) -> Vec<Result<Record, StoreError>> {
        QuestionReader::new(data.as_bytes(), skip_header).collect()
    }

    #[test]
    fn reads_rows_with_line_numbers() {
        let rows = read(
            "1,billing,email,Refund,Where is my refund?\n2,tech,phone,Login,\"Can't log in, help\"\n",
            false,
        );
        let records: Vec<Record> = rows.into_iter().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[0].line_number, 1);
        assert_eq!(records[1].text, "Can't log in, help");
        assert_eq!(records[1].line_number, 2);
    }

    #[test]
    fn skips_header_only_when_asked() {
        let data = "id,queue,source,subject,text\n1,q,s,subj,hello\n";
        assert_eq!(read(data, false).len(), 2);

        let rows = read(data, true);
        assert_eq!(rows.len(), 1);
        let record = rows.into_iter().next().unwrap().unwrap();
        assert_eq!(record.id, "1");
        assert_eq!(record.line_number, 2);
    }

    #[test]
    fn empty_text_is_still_a_record() {
        let rows = read("1,q,s,subj,\n", false);
        let record = rows.into_iter().next().unwrap().unwrap();
        assert!(!record.has_text());
    }

    #[test]
    fn wrong_column_count_is_fatal_with_line() {
        let rows = read("1,q,s,subj,hello\n2,q,s,hello\n3,q,s,subj,never read\n", false);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_ok());
        match &rows[1] {
            Err(StoreError::MalformedRow {
                line,
                expected,
                found,
            }) => {
                assert_eq!(*line, 2);
                assert_eq!(*expected, 5);
                assert_eq!(*found, 4);
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_fatal() {
        let mut data = b"1,q,s,subj,hello\n2,q,s,subj,".to_vec();
        data.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let rows: Vec<_> = QuestionReader::new(data.as_slice(), false).collect();
        assert_eq!(rows.len(), 2);
        assert!(matches!(rows[1], Err(StoreError::Csv { line: 2, .. })));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_questions(Path::new("/nonexistent/questions.csv"), false).err();
        assert!(matches!(err, Some(StoreError::InputNotFound(_))));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let rows = read("1,q,s,subj,hello\n\n2,q,s,subj,world\n\n", false);
        let ids: Vec<String> = rows.into_iter().map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec!["1", "2"]);

        let rows = read("\nid,queue,source,subject,text\n1,q,s,subj,hello\n", true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_ref().unwrap().id, "1");
    }
}
