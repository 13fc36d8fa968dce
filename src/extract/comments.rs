/// Comment bodies read from the comments part.
///
/// This module provides the [`Comment`] record and the scanner for
/// `word/comments.xml`. A comment carries its authorship, its body text, and
/// the `w14:paraId` of every paragraph in its body; those paragraph ids are the
/// keys the thread metadata uses to refer to the comment.
use crate::config::ReportOptions;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::package::PartKind;
use crate::xml::{Name, PartScanner, W14_NS, W_NS};
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use std::collections::HashSet;
use tracing::warn;

const COMMENTS: Name = (W_NS, b"comments");
const COMMENT: Name = (W_NS, b"comment");
const PARAGRAPH: Name = (W_NS, b"p");
const TEXT: Name = (W_NS, b"t");
const ID: Name = (W_NS, b"id");
const AUTHOR: Name = (W_NS, b"author");
const INITIALS: Name = (W_NS, b"initials");
const DATE: Name = (W_NS, b"date");
const PARA_ID: Name = (W14_NS, b"paraId");

/// Paragraph ids of one comment. Almost every comment has one or two.
pub type ThreadIds = SmallVec<[String; 2]>;

/// A comment in a Word document.
///
/// Represents a `<w:comment>` element. Absent authorship attributes have
/// already been replaced by the configured sentinel.
///
/// # Examples
///
/// ```rust,no_run
/// use docx_comments::{CommentParts, ReportOptions, extract};
///
/// let parts = CommentParts::from_path("review.docx")?;
/// let extraction = extract(&parts, &ReportOptions::default())?;
///
/// for comment in extraction.comments() {
///     println!("Comment {} by {}: {}", comment.id(), comment.author(), comment.text());
/// }
/// # Ok::<(), docx_comments::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The comment ID, shared with the anchor range markers
    id: String,
    /// Author name
    author: String,
    /// Author initials
    initials: String,
    /// Date of comment creation, as written in the document
    date: String,
    /// Body text, paragraphs joined and trimmed
    text: String,
    /// `w14:paraId` of every body paragraph, in document order
    thread_ids: ThreadIds,
}

impl Comment {
    /// Create a new Comment.
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        initials: impl Into<String>,
        date: impl Into<String>,
        text: impl Into<String>,
        thread_ids: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            initials: initials.into(),
            date: date.into(),
            text: text.into(),
            thread_ids: thread_ids.into_iter().collect(),
        }
    }

    /// Get the comment ID.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the author name.
    #[inline]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Get the author initials.
    #[inline]
    pub fn initials(&self) -> &str {
        &self.initials
    }

    /// Get the comment date.
    #[inline]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Get the body text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the paragraph ids that link this comment to its thread metadata.
    #[inline]
    pub fn thread_ids(&self) -> &[String] {
        &self.thread_ids
    }
}

/// A `<w:comment>` being read.
#[derive(Default)]
struct PendingComment {
    id: Option<String>,
    author: Option<String>,
    initials: Option<String>,
    date: Option<String>,
    paragraphs: Vec<String>,
    thread_ids: ThreadIds,
}

impl PendingComment {
    fn start(scanner: &PartScanner<'_>, e: &BytesStart) -> Result<Self> {
        Ok(Self {
            id: scanner.attr(e, ID)?,
            author: scanner.attr(e, AUTHOR)?,
            initials: scanner.attr(e, INITIALS)?,
            date: scanner.attr(e, DATE)?,
            ..Self::default()
        })
    }

    /// Record a descendant element of the comment.
    fn open_child(&mut self, scanner: &PartScanner<'_>, e: &BytesStart) -> Result<()> {
        if let Some(para_id) = scanner.attr(e, PARA_ID)? {
            self.thread_ids.push(para_id);
        }
        if scanner.is(e, PARAGRAPH) {
            self.paragraphs.push(String::new());
        }
        Ok(())
    }

    /// The buffer text is appended to.
    fn text_mut(&mut self) -> &mut String {
        if self.paragraphs.is_empty() {
            self.paragraphs.push(String::new());
        }
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }

    fn finish(
        self,
        options: &ReportOptions,
        seen: &mut HashSet<String>,
        diagnostics: &mut Diagnostics,
    ) -> Option<Comment> {
        let Some(id) = self.id else {
            warn!("comment without w:id skipped");
            diagnostics.missing_attributes += 1;
            return None;
        };
        if !seen.insert(id.clone()) {
            warn!(comment = %id, "duplicate comment id, keeping the first occurrence");
            diagnostics.duplicate_ids += 1;
            return None;
        }

        let mut or_sentinel = |value: Option<String>, attribute: &str| {
            value.unwrap_or_else(|| {
                warn!(comment = %id, attribute, "missing attribute, using sentinel");
                diagnostics.missing_attributes += 1;
                options.missing_sentinel.clone()
            })
        };
        let author = or_sentinel(self.author, "w:author");
        let initials = or_sentinel(self.initials, "w:initials");
        let date = or_sentinel(self.date, "w:date");

        let text = self.paragraphs.join(&options.paragraph_separator);

        Some(Comment {
            text: text.trim().to_string(),
            id,
            author,
            initials,
            date,
            thread_ids: self.thread_ids,
        })
    }
}

/// Extract all comments from a comments part, in document order.
pub(crate) fn parse_comments(
    bytes: &[u8],
    options: &ReportOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Comment>> {
    let mut scanner = PartScanner::new(PartKind::Comments, bytes, COMMENTS)?;

    let mut comments = Vec::new();
    let mut seen = HashSet::new();
    let mut current: Option<PendingComment> = None;
    let mut comment_depth = 0;
    let mut in_text = false;

    while let Some(event) = scanner.next_event()? {
        match event {
            Event::Start(e) => {
                if let Some(pending) = current.as_mut() {
                    pending.open_child(&scanner, &e)?;
                    if scanner.is(&e, TEXT) {
                        in_text = true;
                    }
                } else if scanner.is(&e, COMMENT) {
                    current = Some(PendingComment::start(&scanner, &e)?);
                    comment_depth = scanner.depth();
                }
            },
            Event::Empty(e) => {
                if let Some(pending) = current.as_mut() {
                    pending.open_child(&scanner, &e)?;
                } else if scanner.is(&e, COMMENT) {
                    let pending = PendingComment::start(&scanner, &e)?;
                    comments.extend(pending.finish(options, &mut seen, diagnostics));
                }
            },
            Event::Text(t) if in_text => {
                if let Some(pending) = current.as_mut() {
                    scanner.push_text(pending.text_mut(), &t)?;
                }
            },
            Event::GeneralRef(r) if in_text => {
                if let Some(pending) = current.as_mut() {
                    scanner.push_reference(pending.text_mut(), &r)?;
                }
            },
            Event::End(e) => {
                if current.is_none() {
                    continue;
                }
                if scanner.depth() < comment_depth {
                    in_text = false;
                    if let Some(pending) = current.take() {
                        comments.extend(pending.finish(options, &mut seen, diagnostics));
                    }
                } else if scanner.is_end(e.name(), TEXT) {
                    in_text = false;
                }
            },
            _ => {},
        }
    }

    Ok(comments)
}
