//! docx-comments - Extract threaded review comments from Word documents
//!
//! A `.docx` package keeps review comments in three separate parts that refer
//! to each other through different identifiers:
//!
//! - `word/comments.xml`: comment bodies and authorship, keyed by comment id
//! - `word/commentsExtended.xml`: reply links and resolution state, keyed by
//!   paragraph id
//! - `word/document.xml`: the commented text, delimited by range markers keyed
//!   by comment id
//!
//! This crate joins the three into one flat report in which every reply
//! directly follows the comment it answers.
//!
//! # Pipeline
//!
//! 1. [`extract()`] parses each part into an independent mapping
//! 2. [`reconcile`](reconcile::reconcile) joins them into one record per comment
//! 3. [`assemble`](thread::assemble) builds the parent/child reply index
//! 4. [`linearize`](report::linearize) orders the records into report rows
//!
//! [`build_report`] runs all four; a [`ReportWriter`](report::writer::ReportWriter)
//! presents the result.
//!
//! # Example
//!
//! ```no_run
//! use docx_comments::report::writer::{OutputFormat, WriterOptions, write_report_to_path};
//! use docx_comments::{ReportOptions, report_from_path};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = report_from_path("review.docx", &ReportOptions::default())?;
//! for row in report.rows() {
//!     println!("{} by {}: {}", row.id, row.author, row.comment);
//! }
//!
//! write_report_to_path(&report, "review.xlsx", &WriterOptions::new(OutputFormat::Xlsx))?;
//! # Ok(())
//! # }
//! ```
//!
//! Malformed parts are the only fatal condition. Gaps in the data (missing
//! attributes, dangling reply links, unknown paragraph ids) are repaired and
//! tallied in the report's [`Diagnostics`].

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod package;
pub mod reconcile;
pub mod report;
pub mod thread;
pub mod xml;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{AnchorScope, ReportOptions};
pub use diagnostics::Diagnostics;
pub use error::{Error, Result};
pub use extract::{Comment, Extraction, extract};
pub use package::{CommentParts, DocxPackage, PartKind, PartSource};
pub use report::{CommentRow, Report};

use std::path::Path;
use tracing::{info, warn};

/// Build the report for a set of comment parts.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] when one of the parts cannot be parsed.
pub fn build_report(parts: &CommentParts, options: &ReportOptions) -> Result<Report> {
    let extraction = extract(parts, options)?;

    let mut diagnostics = Diagnostics::default();
    let reconciled = reconcile::reconcile(&extraction, &mut diagnostics);
    let index = thread::assemble(extraction.threads(), reconciled.owners(), &mut diagnostics);
    let rows = report::linearize(&reconciled, &index, &mut diagnostics);
    diagnostics.merge(extraction.diagnostics());

    if diagnostics.is_clean() {
        info!(rows = rows.len(), replies = index.link_count(), "comments reconciled");
    } else {
        warn!(rows = rows.len(), %diagnostics, "comments reconciled with repairs");
    }

    Ok(Report::new(rows, options.clone(), diagnostics))
}

/// Open a `.docx` file and build its comment report.
pub fn report_from_path<P: AsRef<Path>>(path: P, options: &ReportOptions) -> Result<Report> {
    let parts = CommentParts::from_path(path)?;
    build_report(&parts, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::writer::{OutputFormat, WriterOptions, write_report_to_path};
    use crate::test_support::{
        anchored_paragraph, comment, comment_ex, comments_xml, docx_bytes, document_xml,
        extended_xml, parts,
    };
    use std::io::Read;

    fn review_parts() -> (String, String, String) {
        (
            comments_xml(&format!(
                "{}{}",
                comment("0", "A", "P0", "Check this"),
                comment("1", "B", "P1", "Agreed"),
            )),
            extended_xml(&format!(
                "{}{}",
                comment_ex("P0", None, false),
                comment_ex("P1", Some("P0"), true),
            )),
            document_xml(&anchored_paragraph("0", "Hello world")),
        )
    }

    #[test]
    fn test_reply_follows_its_parent() {
        let (comments, extended, document) = review_parts();
        let report = build_report(
            &CommentParts::new(comments, extended, document),
            &ReportOptions::default(),
        )
        .unwrap();

        let rows: Vec<Vec<String>> = report.cell_rows().collect();
        assert_eq!(
            rows,
            vec![
                vec!["0", "No", "No", "n/a", "A", "2024-05-01T09:00:00Z", "Hello world", "Check this"],
                vec!["1", "Yes", "Yes", "0", "B", "2024-05-01T09:00:00Z", "", "Agreed"],
            ]
        );
        assert!(report.diagnostics().is_clean());
    }

    #[test]
    fn test_split_runs_form_one_anchor() {
        let document = concat!(
            r#"<w:p><w:commentRangeStart w:id="0"/>"#,
            r#"<w:r><w:t xml:space="preserve">Hello </w:t></w:r>"#,
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t>world</w:t></w:r>"#,
            r#"<w:commentRangeEnd w:id="0"/></w:p>"#,
        );
        let report = build_report(
            &parts(
                &comment("0", "A", "P0", "Bold?"),
                &comment_ex("P0", None, false),
                document,
            ),
            &ReportOptions::default(),
        )
        .unwrap();

        assert_eq!(report.rows()[0].doc_text, "Hello world");
    }

    #[test]
    fn test_dangling_reply_is_reported_top_level() {
        let report = build_report(
            &parts(
                &format!(
                    "{}{}",
                    comment("0", "A", "P0", "First"),
                    comment("1", "B", "P1", "Lost reply"),
                ),
                &format!(
                    "{}{}",
                    comment_ex("P0", None, false),
                    comment_ex("P1", Some("GONE"), false),
                ),
                "",
            ),
            &ReportOptions::default(),
        )
        .unwrap();

        let ids: Vec<&str> = report.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["0", "1"]);
        assert!(report.rows()[1].is_reply);
        assert_eq!(report.rows()[1].reply_to, None);
        assert_eq!(report.diagnostics().dangling_references, 1);
    }

    #[test]
    fn test_diagnostics_cover_every_stage() {
        let report = build_report(
            &parts(
                &format!(
                    "{}{}",
                    r#"<w:comment w:id="0" w:date="2024-05-01T09:00:00Z"><w:p w14:paraId="P0"><w:r><w:t>No author</w:t></w:r></w:p></w:comment>"#,
                    comment("1", "B", "P1", "Lost reply"),
                ),
                &format!(
                    "{}{}",
                    comment_ex("P0", None, false),
                    comment_ex("P1", Some("GONE"), false),
                ),
                "",
            ),
            &ReportOptions::default(),
        )
        .unwrap();

        let diagnostics = report.diagnostics();
        assert_eq!(diagnostics.missing_attributes, 2);
        assert_eq!(diagnostics.dangling_references, 1);
        assert_eq!(diagnostics.unresolvable_thread_ids, 0);
    }

    #[test]
    fn test_multi_paragraph_comment_is_clean() {
        let report = build_report(
            &parts(
                concat!(
                    r#"<w:comment w:id="0" w:author="A" w:initials="A" w:date="2024-05-01T09:00:00Z">"#,
                    r#"<w:p w14:paraId="P0a"><w:r><w:t>First</w:t></w:r></w:p>"#,
                    r#"<w:p w14:paraId="P0b"><w:r><w:t>Second</w:t></w:r></w:p>"#,
                    r#"</w:comment>"#,
                ),
                &comment_ex("P0b", None, true),
                &anchored_paragraph("0", "Hello"),
            ),
            &ReportOptions::default(),
        )
        .unwrap();

        assert!(report.rows()[0].resolved);
        assert_eq!(report.rows()[0].comment, "First\nSecond");
        assert!(report.diagnostics().is_clean());
    }

    #[test]
    fn test_malformed_part_fails_the_run() {
        let broken = CommentParts::new(
            comments_xml(&comment("0", "A", "P0", "x")),
            "<w15:commentsEx><unclosed>",
            document_xml(""),
        );
        let err = build_report(&broken, &ReportOptions::default()).unwrap_err();
        assert_eq!(err.part(), Some(PartKind::CommentsExtended));
    }

    #[test]
    fn test_docx_to_workbook() {
        let (comments, extended, document) = review_parts();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("review.docx");
        std::fs::write(
            &input,
            docx_bytes(&[
                ("[Content_Types].xml", "<Types/>"),
                ("word/comments.xml", comments.as_str()),
                ("word/commentsExtended.xml", extended.as_str()),
                ("word/document.xml", document.as_str()),
            ]),
        )
        .unwrap();

        let report = report_from_path(&input, &ReportOptions::default()).unwrap();
        assert_eq!(report.len(), 2);

        let output = dir.path().join("review.xlsx");
        write_report_to_path(&report, &output, &WriterOptions::new(OutputFormat::Xlsx)).unwrap();

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&output).unwrap()).unwrap();
        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains("Hello world"));
        assert!(sheet.contains("Agreed"));
    }

    #[test]
    fn test_missing_part_names_the_part() {
        let (comments, _, document) = review_parts();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("no-threads.docx");
        std::fs::write(
            &input,
            docx_bytes(&[
                ("word/comments.xml", comments.as_str()),
                ("word/document.xml", document.as_str()),
            ]),
        )
        .unwrap();

        let err = report_from_path(&input, &ReportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingPart(PartKind::CommentsExtended)));
        assert!(err.to_string().contains("word/commentsExtended.xml"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let (comments, extended, document) = review_parts();
        let parts = CommentParts::new(comments, extended, document);
        let first = build_report(&parts, &ReportOptions::default()).unwrap();
        let second = build_report(&parts, &ReportOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
