/// Thread metadata read from the extended comments part.
///
/// Every `<w15:commentEx>` in `word/commentsExtended.xml` describes one
/// comment paragraph: whether it replies to another paragraph and whether the
/// thread is marked done.
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::package::PartKind;
use crate::xml::{Name, PartScanner, W15_NS};
use quick_xml::events::Event;
use std::collections::HashMap;
use tracing::warn;

const COMMENTS_EX: Name = (W15_NS, b"commentsEx");
const COMMENT_EX: Name = (W15_NS, b"commentEx");
const PARA_ID: Name = (W15_NS, b"paraId");
const PARA_ID_PARENT: Name = (W15_NS, b"paraIdParent");
const DONE: Name = (W15_NS, b"done");

/// Reply and resolution state of one comment paragraph.
///
/// A node is a reply exactly when it names a parent, so the two can never
/// disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadNode {
    id: String,
    parent_id: Option<String>,
    resolved: bool,
}

impl ThreadNode {
    pub fn new(id: impl Into<String>, parent_id: Option<String>, resolved: bool) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.filter(|p| !p.is_empty()),
            resolved,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// Thread nodes keyed by paragraph id, iterable in part order.
#[derive(Debug, Clone, Default)]
pub struct ThreadMap {
    nodes: Vec<ThreadNode>,
    index: HashMap<String, usize>,
}

impl ThreadMap {
    /// Insert a node. Returns `false` and keeps the existing node when the id
    /// is already present.
    pub fn insert(&mut self, node: ThreadNode) -> bool {
        if self.index.contains_key(node.id()) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    pub fn get(&self, id: &str) -> Option<&ThreadNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ThreadNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<ThreadNode> for ThreadMap {
    fn from_iter<I: IntoIterator<Item = ThreadNode>>(iter: I) -> Self {
        let mut map = ThreadMap::default();
        for node in iter {
            map.insert(node);
        }
        map
    }
}

/// `ST_OnOff` truth markers. Anything else, including an absent attribute,
/// is false.
fn is_on(value: &str) -> bool {
    matches!(value, "1" | "true" | "on")
}

/// Extract all thread nodes from an extended comments part.
pub(crate) fn parse_threads(bytes: &[u8], diagnostics: &mut Diagnostics) -> Result<ThreadMap> {
    let mut scanner = PartScanner::new(PartKind::CommentsExtended, bytes, COMMENTS_EX)?;
    let mut threads = ThreadMap::default();

    while let Some(event) = scanner.next_event()? {
        let (Event::Start(e) | Event::Empty(e)) = event else {
            continue;
        };
        if !scanner.is(&e, COMMENT_EX) {
            continue;
        }

        let Some(id) = scanner.attr(&e, PARA_ID)? else {
            warn!("w15:commentEx without w15:paraId skipped");
            diagnostics.missing_attributes += 1;
            continue;
        };
        let parent_id = scanner.attr(&e, PARA_ID_PARENT)?;
        let resolved = scanner.attr(&e, DONE)?.is_some_and(|v| is_on(&v));

        if !threads.insert(ThreadNode::new(id, parent_id, resolved)) {
            warn!("duplicate w15:paraId in thread metadata, keeping the first occurrence");
            diagnostics.duplicate_ids += 1;
        }
    }

    Ok(threads)
}
