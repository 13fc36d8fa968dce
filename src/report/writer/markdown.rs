//! Markdown pipe-table writer.

use super::ReportWriter;
use crate::error::{Error, Result};
use crate::report::Report;
use std::fmt::Write as FmtWrite;
use std::io::Write;

pub struct MarkdownWriter<W: Write> {
    writer: W,
    buffer: String,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: String::with_capacity(4096),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_row<S: AsRef<str>>(&mut self, cells: &[S]) -> Result<()> {
        self.buffer.push('|');
        for cell in cells {
            let escaped = escape_cell(cell.as_ref());
            write!(self.buffer, " {} |", escaped).map_err(|e| Error::Write(e.to_string()))?;
        }
        self.buffer.push('\n');
        Ok(())
    }
}

/// Escape pipes and keep line breaks inside the cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

impl<W: Write> ReportWriter for MarkdownWriter<W> {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        self.buffer.clear();

        let header = report.header();
        self.write_row(&header)?;

        self.buffer.push('|');
        for _ in 0..header.len() {
            self.buffer.push_str("----------|");
        }
        self.buffer.push('\n');

        for cells in report.cell_rows() {
            self.write_row(&cells)?;
        }

        self.writer.write_all(self.buffer.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}
