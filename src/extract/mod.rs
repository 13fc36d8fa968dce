//! Entity extraction from the three comment parts.
//!
//! Each part is parsed independently into its own mapping:
//!
//! - [`Comment`]s from `word/comments.xml`, keyed by comment id
//! - [`ThreadNode`]s from `word/commentsExtended.xml`, keyed by paragraph id
//! - anchored text from `word/document.xml`, keyed by comment id
//!
//! The mappings are not joined here; that is the job of
//! [`reconcile`](crate::reconcile).

mod anchors;
mod comments;
mod threads;

pub use anchors::AnchorMap;
pub use comments::{Comment, ThreadIds};
pub use threads::{ThreadMap, ThreadNode};

use crate::config::ReportOptions;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::package::CommentParts;
use tracing::debug;

/// The three independent mappings read from a document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    comments: Vec<Comment>,
    threads: ThreadMap,
    anchors: AnchorMap,
    diagnostics: Diagnostics,
}

impl Extraction {
    /// Assemble an extraction from mappings built elsewhere.
    pub fn new(comments: Vec<Comment>, threads: ThreadMap, anchors: AnchorMap) -> Self {
        Self {
            comments,
            threads,
            anchors,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Comments in document order, ids unique.
    #[inline]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    #[inline]
    pub fn threads(&self) -> &ThreadMap {
        &self.threads
    }

    #[inline]
    pub fn anchors(&self) -> &AnchorMap {
        &self.anchors
    }

    /// Conditions repaired while parsing.
    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Parse the three parts into their mappings.
///
/// Fails only when a part is not well-formed markup; the error names the part.
pub fn extract(parts: &CommentParts, options: &ReportOptions) -> Result<Extraction> {
    let mut diagnostics = Diagnostics::default();

    let comments = comments::parse_comments(parts.comments(), options, &mut diagnostics)?;
    let threads = threads::parse_threads(parts.comments_extended(), &mut diagnostics)?;
    let anchors = anchors::parse_anchors(parts.document(), options, &mut diagnostics)?;

    debug!(
        comments = comments.len(),
        threads = threads.len(),
        anchors = anchors.len(),
        "extracted comment parts"
    );

    Ok(Extraction {
        comments,
        threads,
        anchors,
        diagnostics,
    })
}
