/// Tallies of the data-integrity conditions repaired during a run.
///
/// None of these stop a report from being produced. They are counted so the
/// caller can tell a clean document from one that reconciled with gaps.
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Authorship or identity attributes that were absent
    pub missing_attributes: usize,
    /// Reply links whose parent could not be resolved to a comment
    pub dangling_references: usize,
    /// Comment paragraph ids with no entry in the thread metadata
    pub unresolvable_thread_ids: usize,
    /// Comments, threads or anchors whose id was already taken
    pub duplicate_ids: usize,
    /// Comments reachable only through a reply cycle
    pub cyclic_comments: usize,
}

impl Diagnostics {
    /// Whether the document reconciled without any repair.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    /// Add the tallies of another run stage.
    pub fn merge(&mut self, other: &Diagnostics) {
        self.missing_attributes += other.missing_attributes;
        self.dangling_references += other.dangling_references;
        self.unresolvable_thread_ids += other.unresolvable_thread_ids;
        self.duplicate_ids += other.duplicate_ids;
        self.cyclic_comments += other.cyclic_comments;
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} missing attribute(s), {} dangling reference(s), {} unresolvable thread id(s), {} duplicate id(s), {} cyclic comment(s)",
            self.missing_attributes,
            self.dangling_references,
            self.unresolvable_thread_ids,
            self.duplicate_ids,
            self.cyclic_comments,
        )
    }
}
