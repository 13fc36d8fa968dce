//! Reply thread assembly.
//!
//! Builds the parent → children index between comments. The index comes from
//! the paragraph-level reply links in the thread metadata, lifted to comments
//! through the [`ThreadOwners`] reverse index. Document order plays no part.

use crate::diagnostics::Diagnostics;
use crate::extract::ThreadMap;
use crate::reconcile::{ParentLink, ThreadOwners};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Children of each comment, in the order their reply links were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadIndex<'a> {
    children: HashMap<&'a str, Vec<&'a str>>,
    with_parent: HashSet<&'a str>,
}

impl<'a> ThreadIndex<'a> {
    /// Record `child` as a reply to `parent`. A pair is recorded once.
    pub fn record(&mut self, parent: &'a str, child: &'a str) {
        let children = self.children.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
        self.with_parent.insert(child);
    }

    /// The replies to a comment.
    pub fn children(&self, comment_id: &str) -> &[&'a str] {
        self.children.get(comment_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether a comment was recorded as a reply to another comment.
    pub fn has_parent(&self, comment_id: &str) -> bool {
        self.with_parent.contains(comment_id)
    }

    /// Number of recorded reply links.
    pub fn link_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }
}

/// Build the parent/child comment index from every reply node.
///
/// Reply links whose parent, or whose own paragraph, cannot be resolved to a
/// comment are skipped and counted as dangling references.
pub fn assemble<'a>(
    threads: &ThreadMap,
    owners: &ThreadOwners<'a>,
    diagnostics: &mut Diagnostics,
) -> ThreadIndex<'a> {
    let mut index = ThreadIndex::default();

    for node in threads.iter().filter(|node| node.is_reply()) {
        let Some(child) = owners.owner(node.id()) else {
            warn!(paragraph = %node.id(), "reply paragraph belongs to no comment, link skipped");
            diagnostics.dangling_references += 1;
            continue;
        };

        match owners.parent_link(node, threads) {
            ParentLink::Comment(parent) => index.record(parent, child),
            ParentLink::Dangling => {
                warn!(
                    comment = %child,
                    parent_paragraph = node.parent_id().unwrap_or_default(),
                    "reply parent cannot be resolved, treating comment as top-level"
                );
                diagnostics.dangling_references += 1;
            },
            ParentLink::TopLevel => {},
        }
    }

    index
}
