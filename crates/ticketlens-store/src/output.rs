//! Annotated CSV writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ticketlens_core::encode_row;

use crate::StoreError;

/// Writes encoded rows, one per line.
pub struct RowWriter<W: Write> {
    inner: W,
    rows: u64,
}

impl RowWriter<BufWriter<File>> {
    /// Create (or truncate) the output file.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RowWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, rows: 0 }
    }

    pub fn write_row<I, S>(&mut self, fields: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        writeln!(self.inner, "{}", encode_row(fields))?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far, header included.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, StoreError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_line_per_row() {
        let mut writer = RowWriter::new(Vec::new());
        writer.write_row(["Question Id", "Language", "Score"]).unwrap();
        writer.write_row(["7", "fr", "0.95"]).unwrap();
        assert_eq!(writer.rows_written(), 2);

        let bytes = writer.finish().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "\"Question Id\",\"Language\",\"Score\"\n\"7\",\"fr\",\"0.95\"\n"
        );
    }

    #[test]
    fn create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale contents\n").unwrap();

        let mut writer = RowWriter::create(&path).unwrap();
        writer.write_row(["a"]).unwrap();
        writer.finish().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "\"a\"\n");
    }
}
