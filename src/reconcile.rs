//! Identity reconciliation across the three mappings.
//!
//! The parts use three identifiers for the same comment: the comment id
//! (comments part), the paragraph id of each body paragraph (thread metadata),
//! and the range id of the anchor markers (document body). Range ids equal
//! comment ids, so only the paragraph ids need an explicit join: the
//! [`ThreadOwners`] reverse index.

use crate::diagnostics::Diagnostics;
use crate::extract::{Comment, Extraction, ThreadMap, ThreadNode};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Reverse index from paragraph id to the id of the comment owning it.
#[derive(Debug, Clone, Default)]
pub struct ThreadOwners<'a> {
    owners: HashMap<&'a str, &'a str>,
}

/// Where a thread node's parent link leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLink<'a> {
    /// The node is not a reply
    TopLevel,
    /// The node replies to the comment with this id
    Comment(&'a str),
    /// The node is a reply, but its parent cannot be resolved to another comment
    Dangling,
}

impl<'a> ThreadOwners<'a> {
    /// Index every paragraph id listed by the comments.
    ///
    /// A paragraph id claimed by two comments stays with the first.
    pub fn build(comments: &'a [Comment], diagnostics: &mut Diagnostics) -> Self {
        let mut owners = HashMap::with_capacity(comments.len());
        for comment in comments {
            for thread_id in comment.thread_ids() {
                if let Some(first) = owners.get(thread_id.as_str()) {
                    warn!(
                        paragraph = %thread_id,
                        owner = %first,
                        duplicate = %comment.id(),
                        "paragraph id shared by two comments"
                    );
                    diagnostics.duplicate_ids += 1;
                    continue;
                }
                owners.insert(thread_id.as_str(), comment.id());
            }
        }
        Self { owners }
    }

    /// The id of the comment owning a paragraph.
    pub fn owner(&self, thread_id: &str) -> Option<&'a str> {
        self.owners.get(thread_id).copied()
    }

    /// Resolve a node's parent paragraph to the comment owning it.
    ///
    /// The parent must exist in the thread metadata, have an owner, and that
    /// owner must differ from the node's own owner.
    pub fn parent_link(&self, node: &ThreadNode, threads: &ThreadMap) -> ParentLink<'a> {
        let Some(parent_id) = node.parent_id() else {
            return ParentLink::TopLevel;
        };
        if !threads.contains(parent_id) {
            return ParentLink::Dangling;
        }
        match (self.owner(parent_id), self.owner(node.id())) {
            (Some(parent), Some(own)) if parent == own => ParentLink::Dangling,
            (Some(parent), _) => ParentLink::Comment(parent),
            (None, _) => ParentLink::Dangling,
        }
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// A comment joined with its thread state and anchored text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRecord<'a> {
    pub comment: &'a Comment,
    /// Any of the comment's paragraphs is a reply
    pub is_reply: bool,
    /// Any of the comment's paragraphs is marked done
    pub resolved: bool,
    /// The comment replied to, when the link resolves
    pub reply_to: Option<&'a str>,
    /// Text between the comment's range markers; empty without a range
    pub anchor_text: &'a str,
}

impl<'a> CommentRecord<'a> {
    #[inline]
    pub fn id(&self) -> &'a str {
        self.comment.id()
    }
}

/// Every comment reconciled, in extraction order.
#[derive(Debug, Clone)]
pub struct Reconciliation<'a> {
    records: Vec<CommentRecord<'a>>,
    by_id: HashMap<&'a str, usize>,
    owners: ThreadOwners<'a>,
}

impl<'a> Reconciliation<'a> {
    #[inline]
    pub fn records(&self) -> &[CommentRecord<'a>] {
        &self.records
    }

    pub fn get(&self, comment_id: &str) -> Option<&CommentRecord<'a>> {
        self.by_id.get(comment_id).map(|&i| &self.records[i])
    }

    #[inline]
    pub fn owners(&self) -> &ThreadOwners<'a> {
        &self.owners
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Join the three mappings into one record per comment.
///
/// Reply and resolution state use OR-semantics over the comment's paragraphs.
/// Paragraph ids missing from the thread metadata are skipped. They are
/// only tallied when none of the comment's paragraphs has metadata.
pub fn reconcile<'a>(
    extraction: &'a Extraction,
    diagnostics: &mut Diagnostics,
) -> Reconciliation<'a> {
    let threads = extraction.threads();
    let owners = ThreadOwners::build(extraction.comments(), diagnostics);

    let mut records = Vec::with_capacity(extraction.comments().len());
    let mut by_id = HashMap::with_capacity(extraction.comments().len());

    for comment in extraction.comments() {
        let mut record = CommentRecord {
            comment,
            is_reply: false,
            resolved: false,
            reply_to: None,
            anchor_text: extraction.anchors().get(comment.id()).unwrap_or_default(),
        };

        let mut unresolved = 0;
        let mut any_resolved = false;
        for thread_id in comment.thread_ids() {
            let Some(node) = threads.get(thread_id) else {
                debug!(comment = %comment.id(), paragraph = %thread_id, "paragraph id not in thread metadata");
                unresolved += 1;
                continue;
            };
            any_resolved = true;
            record.resolved |= node.is_resolved();
            if node.is_reply() {
                record.is_reply = true;
                if record.reply_to.is_none()
                    && let ParentLink::Comment(parent) = owners.parent_link(node, threads)
                {
                    record.reply_to = Some(parent);
                }
            }
        }

        // Word only writes metadata for a comment's last paragraph.
        if !any_resolved {
            diagnostics.unresolvable_thread_ids += unresolved;
        }

        by_id.insert(comment.id(), records.len());
        records.push(record);
    }

    Reconciliation {
        records,
        by_id,
        owners,
    }
}
