//! YAML record writer.
//!
//! Unlike the tabular formats, flags stay booleans and a missing reply target
//! stays `null` instead of the reply sentinel.

use super::ReportWriter;
use crate::error::{Error, Result};
use crate::report::{CommentRow, Report};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct YamlRecord<'r> {
    id: &'r str,
    resolved: bool,
    is_reply: bool,
    reply_to: Option<&'r str>,
    author: &'r str,
    #[serde(skip_serializing_if = "Option::is_none")]
    initials: Option<&'r str>,
    date: &'r str,
    doc_text: &'r str,
    comment: &'r str,
}

impl<'r> YamlRecord<'r> {
    fn new(row: &'r CommentRow, include_initials: bool) -> Self {
        Self {
            id: &row.id,
            resolved: row.resolved,
            is_reply: row.is_reply,
            reply_to: row.reply_to.as_deref(),
            author: &row.author,
            initials: include_initials.then_some(row.initials.as_str()),
            date: &row.date,
            doc_text: &row.doc_text,
            comment: &row.comment,
        }
    }
}

pub struct YamlWriter<W: Write> {
    writer: W,
}

impl<W: Write> YamlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportWriter for YamlWriter<W> {
    fn write_report(&mut self, report: &Report) -> Result<()> {
        let include_initials = report.options().include_initials;
        let records: Vec<YamlRecord<'_>> = report
            .rows()
            .iter()
            .map(|row| YamlRecord::new(row, include_initials))
            .collect();

        let yaml = serde_saphyr::to_string(&records).map_err(|e| Error::Write(e.to_string()))?;
        self.writer.write_all(yaml.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample_report;
    use super::*;
    use crate::config::ReportOptions;

    fn render(options: ReportOptions) -> String {
        let mut writer = YamlWriter::new(Vec::new());
        writer.write_report(&sample_report(options)).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_yaml_records() {
        let yaml = render(ReportOptions::default());

        assert_eq!(yaml.matches("id:").count(), 2);
        assert!(yaml.contains("author: Bo"));
        assert!(yaml.contains("resolved: true"));
        assert!(yaml.contains("is_reply: false"));
        assert!(yaml.contains("Hello world"));
        assert!(!yaml.contains("initials"));
    }

    #[test]
    fn test_yaml_includes_initials_when_enabled() {
        let yaml = render(ReportOptions::new().with_initials(true));
        assert!(yaml.contains("initials: AL"));
    }
}
