//! Report writers.
//!
//! The core hands a finished [`Report`] to a [`ReportWriter`]; everything about
//! presentation (file format, column widths, bold headers, quoting) lives here.
//!
//! | Format | Writer |
//! |--------|--------|
//! | `.xlsx` | [`XlsxWriter`] |
//! | `.csv`, `.tsv` | [`DelimitedWriter`] |
//! | `.md` | [`MarkdownWriter`] |
//! | `.yaml` | [`YamlWriter`] (feature `yaml`) |

mod delimited;
mod markdown;
mod xlsx;
#[cfg(feature = "yaml")]
mod yaml;

pub use delimited::{DelimitedConfig, DelimitedWriter};
pub use markdown::MarkdownWriter;
pub use xlsx::{XlsxWriter, default_column_width};
#[cfg(feature = "yaml")]
pub use yaml::YamlWriter;

use super::Report;
use crate::error::{Error, Result};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tracing::info;

/// Something that can present a finished report.
pub trait ReportWriter {
    fn write_report(&mut self, report: &Report) -> Result<()>;
}

/// Output formats for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// Excel workbook with a bold header and wrapped cells
    #[default]
    Xlsx,
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
    /// Markdown pipe table
    Markdown,
    /// YAML list of records
    #[cfg(feature = "yaml")]
    Yaml,
}

impl OutputFormat {
    /// File extension conventionally used for the format.
    pub const fn extension(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Markdown => "md",
            #[cfg(feature = "yaml")]
            OutputFormat::Yaml => "yaml",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(OutputFormat::Xlsx),
            "csv" => Some(OutputFormat::Csv),
            "tsv" | "tab" => Some(OutputFormat::Tsv),
            "md" | "markdown" => Some(OutputFormat::Markdown),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    /// Whether the format is plain text.
    pub const fn is_text(self) -> bool {
        !matches!(self, OutputFormat::Xlsx)
    }
}

/// Presentation options for writing a report.
///
/// # Examples
///
/// ```rust
/// use docx_comments::report::writer::{OutputFormat, WriterOptions};
///
/// let options = WriterOptions::new(OutputFormat::Csv).with_bom(true);
/// assert!(options.write_bom);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions {
    pub format: OutputFormat,
    /// Prefix delimited output with a UTF-8 byte order mark
    pub write_bom: bool,
    /// Workbook column widths, by column position; missing entries use defaults
    pub column_widths: Vec<f64>,
    /// Workbook sheet name
    pub sheet_name: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            write_bom: false,
            column_widths: Vec::new(),
            sheet_name: "Comments".to_string(),
        }
    }
}

impl WriterOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_bom(mut self, write_bom: bool) -> Self {
        self.write_bom = write_bom;
        self
    }

    #[inline]
    pub fn with_column_widths(mut self, widths: Vec<f64>) -> Self {
        self.column_widths = widths;
        self
    }

    #[inline]
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }
}

/// Write a report to a seekable sink in the configured format.
pub fn write_report<W: Write + Seek>(report: &Report, sink: W, options: &WriterOptions) -> Result<()> {
    match options.format {
        OutputFormat::Xlsx => XlsxWriter::new(sink)
            .with_sheet_name(options.sheet_name.clone())
            .with_column_widths(options.column_widths.clone())
            .write_report(report),
        _ => write_text_report(report, sink, options),
    }
}

/// Write a report in a text format to any sink.
pub fn write_text_report<W: Write>(report: &Report, sink: W, options: &WriterOptions) -> Result<()> {
    match options.format {
        OutputFormat::Xlsx => Err(Error::Write(
            "xlsx output needs a seekable destination".to_string(),
        )),
        OutputFormat::Csv => {
            let config = DelimitedConfig::csv().with_write_bom(options.write_bom);
            DelimitedWriter::new(sink, config).write_report(report)
        },
        OutputFormat::Tsv => {
            let config = DelimitedConfig::tsv().with_write_bom(options.write_bom);
            DelimitedWriter::new(sink, config).write_report(report)
        },
        OutputFormat::Markdown => MarkdownWriter::new(sink).write_report(report),
        #[cfg(feature = "yaml")]
        OutputFormat::Yaml => YamlWriter::new(sink).write_report(report),
    }
}

/// Write a report to a file.
///
/// The whole report is rendered in memory first, so a failing writer never
/// leaves a truncated file behind.
pub fn write_report_to_path<P: AsRef<Path>>(
    report: &Report,
    path: P,
    options: &WriterOptions,
) -> Result<()> {
    let path = path.as_ref();
    let mut buffer = Cursor::new(Vec::with_capacity(16 * 1024));
    write_report(report, &mut buffer, options)?;
    std::fs::write(path, buffer.into_inner())?;
    info!(path = %path.display(), rows = report.len(), format = ?options.format, "report written");
    Ok(())
}

/// Render a report in a text format.
pub fn render_text(report: &Report, options: &WriterOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_text_report(report, &mut buffer, options)?;
    String::from_utf8(buffer).map_err(|e| Error::Write(e.to_string()))
}
