//! Namespace-aware XML scanning shared by the part parsers.
//!
//! Word binds its vocabularies to the `w`, `w14` and `w15` prefixes, but the
//! prefixes themselves carry no meaning. Elements and attributes are matched
//! by resolved namespace URI and local name, so a document that binds the same
//! namespaces to other prefixes reads identically.

mod escape;

pub use escape::escape_xml;

use crate::error::{Error, Result};
use crate::package::PartKind;
use quick_xml::NsReader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesRef, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, QName, ResolveResult};
use std::borrow::Cow;

/// WordprocessingML main namespace (`w`).
pub const W_NS: &[u8] = b"http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// Word 2010 extensions (`w14`), carrier of paragraph ids.
pub const W14_NS: &[u8] = b"http://schemas.microsoft.com/office/word/2010/wordml";
/// Word 2012 extensions (`w15`), carrier of comment thread state.
pub const W15_NS: &[u8] = b"http://schemas.microsoft.com/office/word/2012/wordml";

/// A qualified element or attribute name: namespace URI plus local name.
pub(crate) type Name = (&'static [u8], &'static [u8]);

/// Event pump over one part that checks well-formedness as it goes.
///
/// quick-xml reports mismatched and unmatched end tags itself; the scanner
/// adds the checks it leaves to the caller: valid UTF-8, a root element with
/// the expected name, and no elements left open at the end of input.
pub(crate) struct PartScanner<'a> {
    reader: NsReader<&'a [u8]>,
    part: PartKind,
    root: Name,
    depth: usize,
    saw_root: bool,
}

impl<'a> PartScanner<'a> {
    pub fn new(part: PartKind, bytes: &'a [u8], root: Name) -> Result<Self> {
        if let Err(e) = std::str::from_utf8(bytes) {
            return Err(Error::malformed(part, format!("invalid UTF-8: {}", e)));
        }

        let mut reader = NsReader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        Ok(Self {
            reader,
            part,
            root,
            depth: 0,
            saw_root: false,
        })
    }

    /// Number of currently open elements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Read the next event, or `None` once the document ended cleanly.
    pub fn next_event(&mut self) -> Result<Option<Event<'a>>> {
        let event = match self.reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(Error::malformed(
                    self.part,
                    format!("at byte {}: {}", self.reader.buffer_position(), e),
                ));
            },
        };

        match &event {
            Event::Start(e) => {
                self.check_root(e)?;
                self.depth += 1;
            },
            Event::Empty(e) => self.check_root(e)?,
            Event::End(_) => self.depth = self.depth.saturating_sub(1),
            Event::Eof => {
                if !self.saw_root {
                    return Err(Error::malformed(self.part, "no root element"));
                }
                if self.depth > 0 {
                    return Err(Error::malformed(
                        self.part,
                        format!(
                            "unexpected end of document with {} element(s) left open",
                            self.depth
                        ),
                    ));
                }
                return Ok(None);
            },
            _ => {},
        }

        Ok(Some(event))
    }

    fn check_root(&mut self, e: &BytesStart) -> Result<()> {
        if self.saw_root {
            if self.depth == 0 {
                return Err(Error::malformed(self.part, "more than one root element"));
            }
            return Ok(());
        }

        self.saw_root = true;
        if !self.is(e, self.root) {
            return Err(Error::malformed(
                self.part,
                format!(
                    "unexpected root element <{}>, expected {{{}}}{}",
                    String::from_utf8_lossy(e.name().as_ref()),
                    String::from_utf8_lossy(self.root.0),
                    String::from_utf8_lossy(self.root.1),
                ),
            ));
        }
        Ok(())
    }

    /// Whether an element has the given namespace and local name.
    pub fn is(&self, e: &BytesStart, (ns, local): Name) -> bool {
        let (resolved, local_name) = self.reader.resolver().resolve_element(e.name());
        local_name.as_ref() == local && is_bound_to(&resolved, ns)
    }

    /// Whether an end tag closes an element with the given name.
    pub fn is_end(&self, name: QName, (ns, local): Name) -> bool {
        let (resolved, local_name) = self.reader.resolver().resolve_element(name);
        local_name.as_ref() == local && is_bound_to(&resolved, ns)
    }

    /// The value of a namespaced attribute, whitespace-normalized and unescaped.
    pub fn attr(&self, e: &BytesStart, (ns, local): Name) -> Result<Option<String>> {
        for attr in e.attributes().with_checks(false).flatten() {
            let (resolved, name) = self.reader.resolver().resolve_attribute(attr.key);
            if name.as_ref() != local || !is_bound_to(&resolved, ns) {
                continue;
            }
            let attr = normalize_whitespace(attr);
            let value = attr.unescape_value().map_err(|e| {
                Error::malformed(
                    self.part,
                    format!("attribute {}: {}", String::from_utf8_lossy(local), e),
                )
            })?;
            return Ok(Some(value.into_owned()));
        }
        Ok(None)
    }

    /// Append the text of a general reference event (`&amp;`, `&#10;`, ...).
    ///
    /// Entities other than the predefined five are kept verbatim.
    pub fn push_reference(&self, out: &mut String, reference: &BytesRef) -> Result<()> {
        let malformed = |e: quick_xml::Error| Error::malformed(self.part, format!("reference: {}", e));

        if let Some(ch) = reference.resolve_char_ref().map_err(malformed)? {
            out.push(ch);
            return Ok(());
        }
        let name = reference.decode().map_err(|e| malformed(e.into()))?;
        match resolve_predefined_entity(&name) {
            Some(text) => out.push_str(text),
            None => {
                out.push('&');
                out.push_str(&name);
                out.push(';');
            },
        }
        Ok(())
    }

    /// Append the text of a text event.
    pub fn push_text(&self, out: &mut String, text: &BytesText) -> Result<()> {
        let decoded = text
            .decode()
            .map_err(|e| Error::malformed(self.part, format!("text: {}", e)))?;
        out.push_str(&decoded);
        Ok(())
    }
}

fn is_bound_to(resolved: &ResolveResult, ns: &[u8]) -> bool {
    matches!(resolved, ResolveResult::Bound(Namespace(bound)) if *bound == ns)
}

/// Replace literal tabs and line breaks in a raw attribute value with spaces.
///
/// Character references such as `&#10;` are untouched, so an escaped line
/// break survives unescaping.
fn normalize_whitespace(attr: Attribute<'_>) -> Attribute<'_> {
    if !attr.value.iter().any(|b| matches!(b, b'\t' | b'\n' | b'\r')) {
        return attr;
    }

    let mut value = Vec::with_capacity(attr.value.len());
    let mut bytes = attr.value.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        match b {
            b'\r' => {
                bytes.next_if_eq(&b'\n');
                value.push(b' ');
            },
            b'\t' | b'\n' => value.push(b' '),
            b => value.push(b),
        }
    }
    Attribute {
        key: attr.key,
        value: Cow::Owned(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: Name = (W_NS, b"comments");

    fn drain(bytes: &[u8]) -> Result<usize> {
        let mut scanner = PartScanner::new(PartKind::Comments, bytes, ROOT)?;
        let mut count = 0;
        while scanner.next_event()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    #[test]
    fn test_prefix_independent_matching() {
        let xml = br#"<x:comments xmlns:x="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#;
        assert_eq!(drain(xml).unwrap(), 1);
    }

    #[test]
    fn test_wrong_root_is_malformed() {
        let xml = br#"<comments xmlns="urn:other"/>"#;
        let err = drain(xml).unwrap_err();
        assert_eq!(err.part(), Some(PartKind::Comments));
        assert!(err.to_string().contains("unexpected root element"));
    }

    #[test]
    fn test_unclosed_element_is_malformed() {
        let xml = br#"<w:comments xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:comment>"#;
        let err = drain(xml).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { part: PartKind::Comments, .. }));
    }

    #[test]
    fn test_mismatched_end_tag_is_malformed() {
        let xml = br#"<w:comments xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p></w:r></w:comments>"#;
        assert!(matches!(drain(xml), Err(Error::MalformedInput { .. })));
    }

    #[test]
    fn test_empty_and_non_utf8_input() {
        assert!(drain(b"").unwrap_err().to_string().contains("no root element"));
        assert!(drain(&[0x3c, 0xff, 0xfe]).unwrap_err().to_string().contains("UTF-8"));
    }

    #[test]
    fn test_push_reference() {
        let xml = br#"<w:comments xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">a &amp;&#x20;&#66;&nbsp;</w:comments>"#;
        let mut scanner = PartScanner::new(PartKind::Comments, xml, ROOT).unwrap();
        let mut out = String::new();
        while let Some(event) = scanner.next_event().unwrap() {
            match event {
                Event::Text(t) => scanner.push_text(&mut out, &t).unwrap(),
                Event::GeneralRef(r) => scanner.push_reference(&mut out, &r).unwrap(),
                _ => {},
            }
        }
        assert_eq!(out, "a & B&nbsp;");
    }

    #[test]
    fn test_null_char_reference_is_malformed() {
        let xml = br#"<w:comments xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">&#0;</w:comments>"#;
        let mut scanner = PartScanner::new(PartKind::Comments, xml, ROOT).unwrap();
        let mut out = String::new();
        let mut result = Ok(());
        while let Some(event) = scanner.next_event().unwrap() {
            if let Event::GeneralRef(r) = event {
                result = scanner.push_reference(&mut out, &r);
            }
        }
        assert!(matches!(result, Err(Error::MalformedInput { part: PartKind::Comments, .. })));
    }

    fn root_attr(xml: &[u8], name: Name) -> Result<Option<String>> {
        let mut scanner = PartScanner::new(PartKind::Comments, xml, ROOT)?;
        while let Some(event) = scanner.next_event()? {
            if let Event::Start(e) | Event::Empty(e) = event {
                return scanner.attr(&e, name);
            }
        }
        Ok(None)
    }

    #[test]
    fn test_attribute_whitespace_is_normalized() {
        let xml = b"<w:comments xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" w:author=\"Ann\nLee\tB\r\nC &#10;D &amp; E\"/>";
        assert_eq!(
            root_attr(xml, (W_NS, b"author")).unwrap().as_deref(),
            Some("Ann Lee B C \nD & E")
        );
        assert_eq!(root_attr(xml, (W_NS, b"date")).unwrap(), None);
    }

    #[test]
    fn test_bad_attribute_reference_is_malformed() {
        let xml = br#"<w:comments xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" w:author="a &#xZZ; b"/>"#;
        let err = root_attr(xml, (W_NS, b"author")).unwrap_err();
        assert_eq!(err.part(), Some(PartKind::Comments));
    }
}
