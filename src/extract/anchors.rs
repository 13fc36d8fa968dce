/// Anchored document text read from the document body.
///
/// A comment is anchored by a `w:commentRangeStart` / `w:commentRangeEnd`
/// pair whose `w:id` equals the comment id. The anchored text is the text of
/// the runs between the two markers, under the rule selected by
/// [`AnchorScope`].
///
/// The body is scanned once. Every element gets a frame number; a range
/// remembers the frame of its start marker's parent, which is what the
/// sibling rule compares against. A run only contributes to ranges that were
/// open when it started and are still open when it ends, and a range only
/// keeps its text once its end marker is seen.
use crate::config::{AnchorScope, ReportOptions};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::package::PartKind;
use crate::xml::{Name, PartScanner, W_NS};
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::{debug, warn};

const DOCUMENT: Name = (W_NS, b"document");
const RANGE_START: Name = (W_NS, b"commentRangeStart");
const RANGE_END: Name = (W_NS, b"commentRangeEnd");
const RUN: Name = (W_NS, b"r");
const TEXT: Name = (W_NS, b"t");
const ID: Name = (W_NS, b"id");

/// Anchored text keyed by comment id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorMap {
    texts: HashMap<String, String>,
}

impl AnchorMap {
    /// The anchored text of a comment, if the document has a range for it.
    pub fn get(&self, comment_id: &str) -> Option<&str> {
        self.texts.get(comment_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnchorMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            texts: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// A range whose start marker has been seen.
struct OpenRange {
    id: String,
    /// Frame of the element containing the start marker
    parent: Option<usize>,
    /// Text of the runs collected so far
    text: String,
    runs: usize,
}

/// The outermost run being read.
struct OpenRun {
    /// Scanner depth of the run element
    depth: usize,
    text: String,
    /// Ids of the ranges the run may contribute to
    targets: SmallVec<[String; 2]>,
}

struct AnchorScanner<'o> {
    options: &'o ReportOptions,
    /// Frame numbers of the open elements, innermost last
    frames: Vec<usize>,
    next_frame: usize,
    open: Vec<OpenRange>,
    run: Option<OpenRun>,
    in_text: bool,
    anchors: AnchorMap,
}

impl<'o> AnchorScanner<'o> {
    fn new(options: &'o ReportOptions) -> Self {
        Self {
            options,
            frames: Vec::with_capacity(32),
            next_frame: 0,
            open: Vec::new(),
            run: None,
            in_text: false,
            anchors: AnchorMap::default(),
        }
    }

    fn parent_frame(&self) -> Option<usize> {
        self.frames.last().copied()
    }

    fn push_frame(&mut self) {
        self.frames.push(self.next_frame);
        self.next_frame += 1;
    }

    fn open_range(&mut self, id: String) {
        let parent = self.parent_frame();
        if let Some(existing) = self.open.iter().position(|r| r.id == id) {
            debug!(comment = %id, "comment range restarted before its end marker");
            self.open.remove(existing);
        }
        self.open.push(OpenRange {
            id,
            parent,
            text: String::new(),
            runs: 0,
        });
    }

    fn close_range(&mut self, id: &str, diagnostics: &mut Diagnostics) {
        let Some(position) = self.open.iter().position(|r| r.id == id) else {
            debug!(comment = %id, "comment range end without a start marker");
            return;
        };
        let range = self.open.remove(position);
        let text = range.text.trim().to_string();
        if self.anchors.texts.contains_key(&range.id) {
            warn!(comment = %range.id, "comment range appears twice, keeping the first");
            diagnostics.duplicate_ids += 1;
            return;
        }
        self.anchors.texts.insert(range.id, text);
    }

    /// Ranges a run starting at the current position may belong to.
    fn run_targets(&self) -> SmallVec<[String; 2]> {
        let parent = self.parent_frame();
        self.open
            .iter()
            .filter(|range| match self.options.anchor_scope {
                AnchorScope::Sibling => range.parent == parent,
                AnchorScope::Document => true,
            })
            .map(|range| range.id.clone())
            .collect()
    }

    fn finish_run(&mut self, run: OpenRun) {
        for target in &run.targets {
            let Some(range) = self.open.iter_mut().find(|r| &r.id == target) else {
                // Ended inside the run: the run does not precede the end marker.
                continue;
            };
            if range.runs > 0 {
                range.text.push_str(&self.options.run_separator);
            }
            range.text.push_str(&run.text);
            range.runs += 1;
        }
    }

    fn on_element(
        &mut self,
        scanner: &PartScanner<'_>,
        e: &BytesStart,
        empty: bool,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        if scanner.is(e, RANGE_START) {
            match scanner.attr(e, ID)? {
                Some(id) => self.open_range(id),
                None => {
                    warn!("w:commentRangeStart without w:id skipped");
                    diagnostics.missing_attributes += 1;
                },
            }
        } else if scanner.is(e, RANGE_END) {
            match scanner.attr(e, ID)? {
                Some(id) => self.close_range(&id, diagnostics),
                None => {
                    warn!("w:commentRangeEnd without w:id skipped");
                    diagnostics.missing_attributes += 1;
                },
            }
        } else if !empty && self.run.is_none() && scanner.is(e, RUN) {
            self.run = Some(OpenRun {
                depth: scanner.depth(),
                text: String::new(),
                targets: self.run_targets(),
            });
        } else if !empty && self.run.is_some() && scanner.is(e, TEXT) {
            self.in_text = true;
        }
        Ok(())
    }

    fn on_end(&mut self, scanner: &PartScanner<'_>) {
        self.frames.pop();
        self.in_text = false;

        let run_closed = self
            .run
            .as_ref()
            .is_some_and(|run| scanner.depth() < run.depth);
        if run_closed && let Some(run) = self.run.take() {
            self.finish_run(run);
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match (&mut self.run, self.in_text) {
            (Some(run), true) => Some(&mut run.text),
            _ => None,
        }
    }

    fn finish(self) -> AnchorMap {
        for range in &self.open {
            debug!(comment = %range.id, "comment range never closed, anchored text left empty");
        }
        let mut anchors = self.anchors;
        for range in self.open {
            anchors.texts.entry(range.id).or_default();
        }
        anchors
    }
}

/// Extract the anchored text of every comment range in a document part.
///
/// Ranges that are never closed map to an empty string.
pub(crate) fn parse_anchors(
    bytes: &[u8],
    options: &ReportOptions,
    diagnostics: &mut Diagnostics,
) -> Result<AnchorMap> {
    let mut scanner = PartScanner::new(PartKind::Document, bytes, DOCUMENT)?;
    let mut state = AnchorScanner::new(options);

    while let Some(event) = scanner.next_event()? {
        match event {
            Event::Start(e) => {
                state.on_element(&scanner, &e, false, diagnostics)?;
                state.push_frame();
            },
            Event::Empty(e) => state.on_element(&scanner, &e, true, diagnostics)?,
            Event::End(_) => state.on_end(&scanner),
            Event::Text(t) => {
                if let Some(text) = state.text_mut() {
                    scanner.push_text(text, &t)?;
                }
            },
            Event::GeneralRef(r) => {
                if let Some(text) = state.text_mut() {
                    scanner.push_reference(text, &r)?;
                }
            },
            _ => {},
        }
    }

    Ok(state.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{anchored_paragraph, document_xml};

    fn parse_with(body: &str, options: &ReportOptions) -> AnchorMap {
        let mut diagnostics = Diagnostics::default();
        parse_anchors(document_xml(body).as_bytes(), options, &mut diagnostics).unwrap()
    }

    fn parse(body: &str) -> AnchorMap {
        parse_with(body, &ReportOptions::default())
    }

    #[test]
    fn test_single_run_anchor() {
        let anchors = parse(&anchored_paragraph("0", "  Hello world "));
        assert_eq!(anchors.get("0"), Some("Hello world"));
        assert_eq!(anchors.len(), 1);
    }

    #[test]
    fn test_multi_run_anchor_concatenates_in_order() {
        let anchors = parse(
            r#"<w:p><w:r><w:t>Before </w:t></w:r><w:commentRangeStart w:id="0"/>
                 <w:r><w:t xml:space="preserve">Hello </w:t></w:r>
                 <w:r><w:rPr><w:b/></w:rPr><w:t>world</w:t></w:r>
                 <w:commentRangeEnd w:id="0"/><w:r><w:t> after</w:t></w:r></w:p>"#,
        );
        assert_eq!(anchors.get("0"), Some("Hello world"));
    }

    #[test]
    fn test_run_separator_between_runs() {
        let options = ReportOptions::new().with_run_separator("|");
        let anchors = parse_with(
            r#"<w:p><w:commentRangeStart w:id="0"/><w:r><w:t>a</w:t></w:r><w:r><w:t>b</w:t></w:r><w:commentRangeEnd w:id="0"/></w:p>"#,
            &options,
        );
        assert_eq!(anchors.get("0"), Some("a|b"));
    }

    #[test]
    fn test_overlapping_ranges() {
        let anchors = parse(
            r#"<w:p><w:commentRangeStart w:id="0"/><w:r><w:t>one </w:t></w:r>
                 <w:commentRangeStart w:id="1"/><w:r><w:t>two </w:t></w:r>
                 <w:commentRangeEnd w:id="0"/><w:r><w:t>three</w:t></w:r>
                 <w:commentRangeEnd w:id="1"/></w:p>"#,
        );
        assert_eq!(anchors.get("0"), Some("one two"));
        assert_eq!(anchors.get("1"), Some("two three"));
    }

    #[test]
    fn test_sibling_scope_stops_at_paragraph_boundary() {
        let body = r#"<w:p><w:commentRangeStart w:id="0"/><w:r><w:t>first</w:t></w:r></w:p>
                      <w:p/>
                      <w:p><w:r><w:t>second</w:t></w:r><w:commentRangeEnd w:id="0"/></w:p>"#;

        assert_eq!(parse(body).get("0"), Some("first"));

        let options = ReportOptions::new()
            .with_anchor_scope(AnchorScope::Document)
            .with_run_separator("\n");
        assert_eq!(parse_with(body, &options).get("0"), Some("first\nsecond"));
    }

    #[test]
    fn test_sibling_scope_skips_nested_runs() {
        let body = r#"<w:p><w:commentRangeStart w:id="0"/><w:r><w:t>see </w:t></w:r>
                      <w:hyperlink><w:r><w:t>link</w:t></w:r></w:hyperlink>
                      <w:commentRangeEnd w:id="0"/></w:p>"#;

        assert_eq!(parse(body).get("0"), Some("see"));

        let options = ReportOptions::new().with_anchor_scope(AnchorScope::Document);
        assert_eq!(parse_with(body, &options).get("0"), Some("see link"));
    }

    #[test]
    fn test_run_containing_end_marker_is_excluded() {
        let anchors = parse(
            r#"<w:p><w:commentRangeStart w:id="0"/><w:r><w:t>kept</w:t></w:r>
                 <w:r><w:t>dropped</w:t><w:commentRangeEnd w:id="0"/></w:r></w:p>"#,
        );
        assert_eq!(anchors.get("0"), Some("kept"));
    }

    #[test]
    fn test_point_anchor_and_unclosed_range_are_empty() {
        let anchors = parse(
            r#"<w:p><w:commentRangeStart w:id="0"/><w:commentRangeEnd w:id="0"/>
                 <w:commentRangeStart w:id="1"/><w:r><w:t>dangling</w:t></w:r></w:p>"#,
        );
        assert_eq!(anchors.get("0"), Some(""));
        assert_eq!(anchors.get("1"), Some(""));
        assert_eq!(anchors.get("2"), None);
    }

    #[test]
    fn test_end_without_start_is_ignored() {
        let anchors = parse(r#"<w:p><w:r><w:t>x</w:t></w:r><w:commentRangeEnd w:id="9"/></w:p>"#);
        assert!(anchors.is_empty());
    }

    #[test]
    fn test_entities_in_anchor_text() {
        let anchors = parse(&anchored_paragraph("3", "Tom &amp; Jerry"));
        assert_eq!(anchors.get("3"), Some("Tom & Jerry"));
    }
}
