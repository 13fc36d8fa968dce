//! Minimal SpreadsheetML workbook writer.
//!
//! Produces a single-sheet workbook: a bold, frozen header row, fixed column
//! widths, and wrapped inline-string cells. Every cell is text, so no shared
//! string table is needed.

use super::ReportWriter;
use crate::error::{Error, Result};
use crate::report::Report;
use crate::xml::escape_xml;
use std::fmt::Write as FmtWrite;
use std::io::{Seek, Write};
use tracing::warn;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Longest text a worksheet cell can hold.
const MAX_CELL_CHARS: usize = 32_767;

/// Longest sheet name a workbook accepts.
const MAX_SHEET_NAME_CHARS: usize = 31;

/// Style index of the header cells (bold, wrapped).
const HEADER_STYLE: u32 = 1;
/// Style index of the body cells (wrapped, top aligned).
const BODY_STYLE: u32 = 2;

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    "</Types>",
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    "</Relationships>",
);

const WORKBOOK_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    "</Relationships>",
);

// Index 0 is the mandatory default format, then header and body.
const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="2">"#,
    r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#,
    r#"<font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#,
    "</fonts>",
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="3">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1" applyAlignment="1"><alignment vertical="top" wrapText="1"/></xf>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment vertical="top" wrapText="1"/></xf>"#,
    "</cellXfs>",
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    "</styleSheet>",
);

/// Default width of a report column, by header.
pub fn default_column_width(header: &str) -> f64 {
    match header {
        "ID" => 6.0,
        "Is Resolved?" | "Is a Reply?" => 12.0,
        "Reply To" => 10.0,
        "Author" => 20.0,
        "Initials" => 9.0,
        "Date" => 22.0,
        "Doc Text" | "Comment" => 60.0,
        _ => 15.0,
    }
}

/// Writes a report as a `.xlsx` workbook.
pub struct XlsxWriter<W: Write + Seek> {
    sink: W,
    sheet_name: String,
    column_widths: Vec<f64>,
}

impl<W: Write + Seek> XlsxWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            sheet_name: "Comments".to_string(),
            column_widths: Vec::new(),
        }
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Override column widths by position; unset positions keep their defaults.
    pub fn with_column_widths(mut self, widths: Vec<f64>) -> Self {
        self.column_widths = widths;
        self
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn workbook_xml(&self) -> String {
        let name = sanitize_sheet_name(&self.sheet_name);
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\n",
                r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            ),
            escape_xml(&name)
        )
    }

    fn sheet_xml(&self, report: &Report) -> Result<String> {
        let header = report.header();
        let mut xml = String::with_capacity(4096 + report.len() * 512);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);

        let last_cell = cell_ref(header.len() as u32, report.len() as u32 + 1);
        write!(xml, r#"<dimension ref="A1:{}"/>"#, last_cell).map_err(fmt_error)?;

        xml.push_str(concat!(
            r#"<sheetViews><sheetView workbookViewId="0">"#,
            r#"<pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/>"#,
            r#"<selection pane="bottomLeft" activeCell="A2" sqref="A2"/>"#,
            "</sheetView></sheetViews>",
        ));

        xml.push_str("<cols>");
        for (col, name) in header.iter().enumerate() {
            let width = self
                .column_widths
                .get(col)
                .copied()
                .unwrap_or_else(|| default_column_width(name));
            write!(
                xml,
                r#"<col min="{0}" max="{0}" width="{1}" customWidth="1"/>"#,
                col + 1,
                width
            )
            .map_err(fmt_error)?;
        }
        xml.push_str("</cols>");

        xml.push_str("<sheetData>");
        write_row(&mut xml, 1, header.iter().copied(), HEADER_STYLE)?;
        for (idx, cells) in report.cell_rows().enumerate() {
            write_row(&mut xml, idx as u32 + 2, cells.iter().map(String::as_str), BODY_STYLE)?;
        }
        xml.push_str("</sheetData></worksheet>");

        Ok(xml)
    }
}

impl<W: Write + Seek> ReportWriter for XlsxWriter<W> {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        let workbook = self.workbook_xml();
        let sheet = self.sheet_xml(report)?;

        let mut zip = ZipWriter::new(&mut self.sink);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (name, content) in [
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", ROOT_RELS_XML),
            ("xl/workbook.xml", workbook.as_str()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML),
            ("xl/styles.xml", STYLES_XML),
            ("xl/worksheets/sheet1.xml", sheet.as_str()),
        ] {
            zip.start_file(name, options).map_err(zip_error)?;
            zip.write_all(content.as_bytes())?;
        }

        zip.finish().map_err(zip_error)?;
        Ok(())
    }
}

fn fmt_error(e: std::fmt::Error) -> Error {
    Error::Write(format!("XML write error: {}", e))
}

fn zip_error(e: zip::result::ZipError) -> Error {
    Error::Write(format!("workbook archive error: {}", e))
}

fn write_row<'c>(
    xml: &mut String,
    row: u32,
    cells: impl Iterator<Item = &'c str>,
    style: u32,
) -> Result<()> {
    let mut buffer = itoa::Buffer::new();
    xml.push_str(r#"<row r=""#);
    xml.push_str(buffer.format(row));
    xml.push_str(r#"">"#);

    for (col, text) in cells.enumerate() {
        let reference = cell_ref(col as u32 + 1, row);
        if text.is_empty() {
            write!(xml, r#"<c r="{}" s="{}"/>"#, reference, style).map_err(fmt_error)?;
            continue;
        }
        write!(
            xml,
            r#"<c r="{}" s="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            reference,
            style,
            escape_xml(&cell_text(text, &reference))
        )
        .map_err(fmt_error)?;
    }

    xml.push_str("</row>");
    Ok(())
}

/// Convert a 1-based column number to letters (1 -> "A", 27 -> "AA").
fn column_to_letters(col: u32) -> String {
    let mut letters = String::new();
    let mut col = col;

    while col > 0 {
        col -= 1;
        let letter = ((col % 26) as u8 + b'A') as char;
        letters.insert(0, letter);
        col /= 26;
    }

    letters
}

fn cell_ref(col: u32, row: u32) -> String {
    let mut reference = column_to_letters(col);
    reference.push_str(itoa::Buffer::new().format(row));
    reference
}

/// Drop characters XML 1.0 cannot carry and clamp to the cell limit.
fn cell_text(text: &str, reference: &str) -> String {
    let mut out: String = text
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && !matches!(c, '\u{fffe}' | '\u{ffff}')))
        .collect();

    if out.chars().count() > MAX_CELL_CHARS {
        warn!(cell = %reference, "cell text exceeds the worksheet limit, truncating");
        out = out.chars().take(MAX_CELL_CHARS).collect();
    }
    out
}

/// Replace characters a sheet name may not contain.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_CHARS)
        .collect();
    if cleaned.trim().is_empty() { "Comments".to_string() } else { cleaned }
}
