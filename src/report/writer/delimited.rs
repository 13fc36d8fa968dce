//! Delimited text (CSV/TSV) writer.

use super::ReportWriter;
use crate::error::Result;
use crate::report::Report;
use std::io::Write;

/// UTF-8 BOM bytes.
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedConfig {
    pub delimiter: u8,
    pub quote: u8,
    pub write_bom: bool,
}

impl Default for DelimitedConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            write_bom: false,
        }
    }
}

impl DelimitedConfig {
    pub fn csv() -> Self {
        Self::default()
    }

    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }

    pub fn with_write_bom(mut self, write_bom: bool) -> Self {
        self.write_bom = write_bom;
        self
    }
}

pub struct DelimitedWriter<W: Write> {
    writer: W,
    config: DelimitedConfig,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(writer: W, config: DelimitedConfig) -> Self {
        Self { writer, config }
    }

    /// Consume the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let delimiter = self.config.delimiter;
        let quote = char::from(self.config.quote);

        for (col_idx, field) in fields.iter().enumerate() {
            if col_idx > 0 {
                self.writer.write_all(&[delimiter])?;
            }

            let field = field.as_ref();
            let needs_quote = field.contains(char::from(delimiter))
                || field.contains('\n')
                || field.contains('\r')
                || field.contains(quote);

            if needs_quote {
                let escaped = field.replace(quote, &format!("{0}{0}", quote));
                let mut quoted = String::with_capacity(escaped.len() + 2);
                quoted.push(quote);
                quoted.push_str(&escaped);
                quoted.push(quote);
                self.writer.write_all(quoted.as_bytes())?;
            } else {
                self.writer.write_all(field.as_bytes())?;
            }
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> ReportWriter for DelimitedWriter<W> {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        if self.config.write_bom {
            self.writer.write_all(&UTF8_BOM)?;
        }

        self.write_record(&report.header())?;
        for cells in report.cell_rows() {
            self.write_record(&cells)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
