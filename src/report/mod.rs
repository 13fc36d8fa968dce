//! Report linearization.
//!
//! Turns reconciled comments and the reply index into the final row sequence:
//! each top-level comment in extraction order, immediately followed by its
//! replies, depth first. The rows are handed to a
//! [`ReportWriter`](writer::ReportWriter) for presentation.

pub mod writer;

use crate::config::ReportOptions;
use crate::diagnostics::Diagnostics;
use crate::reconcile::{CommentRecord, Reconciliation};
use crate::thread::ThreadIndex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// Column headers of the report.
pub const HEADER: [&str; 8] = [
    "ID",
    "Is Resolved?",
    "Is a Reply?",
    "Reply To",
    "Author",
    "Date",
    "Doc Text",
    "Comment",
];

/// Header of the optional initials column, placed after "Author".
pub const INITIALS_HEADER: &str = "Initials";

/// One comment in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRow {
    pub id: String,
    pub resolved: bool,
    pub is_reply: bool,
    pub reply_to: Option<String>,
    pub author: String,
    pub initials: String,
    pub date: String,
    pub doc_text: String,
    pub comment: String,
}

impl From<&CommentRecord<'_>> for CommentRow {
    fn from(record: &CommentRecord<'_>) -> Self {
        let comment = record.comment;
        Self {
            id: comment.id().to_string(),
            resolved: record.resolved,
            is_reply: record.is_reply,
            reply_to: record.reply_to.map(str::to_string),
            author: comment.author().to_string(),
            initials: comment.initials().to_string(),
            date: comment.date().to_string(),
            doc_text: record.anchor_text.to_string(),
            comment: comment.text().to_string(),
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

impl CommentRow {
    /// The row as report cells.
    pub fn cells(&self, options: &ReportOptions) -> Vec<String> {
        let mut cells = Vec::with_capacity(HEADER.len() + 1);
        cells.push(self.id.clone());
        cells.push(yes_no(self.resolved).to_string());
        cells.push(yes_no(self.is_reply).to_string());
        cells.push(
            self.reply_to
                .clone()
                .unwrap_or_else(|| options.reply_to_sentinel.clone()),
        );
        cells.push(self.author.clone());
        if options.include_initials {
            cells.push(self.initials.clone());
        }
        cells.push(self.date.clone());
        cells.push(self.doc_text.clone());
        cells.push(self.comment.clone());
        cells
    }
}

/// A finished report: ordered rows plus what was repaired to build them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    rows: Vec<CommentRow>,
    options: ReportOptions,
    diagnostics: Diagnostics,
}

impl Report {
    pub fn new(rows: Vec<CommentRow>, options: ReportOptions, diagnostics: Diagnostics) -> Self {
        Self {
            rows,
            options,
            diagnostics,
        }
    }

    /// Rows in report order.
    #[inline]
    pub fn rows(&self) -> &[CommentRow] {
        &self.rows
    }

    #[inline]
    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Column headers, including optional columns enabled by the options.
    pub fn header(&self) -> Vec<&'static str> {
        let mut header = HEADER.to_vec();
        if self.options.include_initials {
            header.insert(5, INITIALS_HEADER);
        }
        header
    }

    /// Every row rendered as cells.
    pub fn cell_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| row.cells(&self.options))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Order the reconciled comments into report rows.
///
/// Top-level comments are visited in extraction order; each is followed by
/// its replies depth first, children in the order the index recorded them.
/// A comment is emitted at most once, whatever number of parents it has.
/// Comments that are only reachable through a reply cycle are emitted after
/// the top-level pass, in extraction order, so every comment appears exactly
/// once.
pub fn linearize<'a>(
    reconciled: &Reconciliation<'a>,
    index: &ThreadIndex<'a>,
    diagnostics: &mut Diagnostics,
) -> Vec<CommentRow> {
    let mut seen = HashSet::with_capacity(reconciled.len());
    let mut rows = Vec::with_capacity(reconciled.len());

    for record in reconciled.records() {
        if !index.has_parent(record.id()) {
            emit_thread(record.id(), reconciled, index, &mut seen, &mut rows);
        }
    }

    for record in reconciled.records() {
        if !seen.contains(record.id()) {
            let before = rows.len();
            emit_thread(record.id(), reconciled, index, &mut seen, &mut rows);
            let emitted = rows.len() - before;
            warn!(comment = %record.id(), emitted, "comments only reachable through a reply cycle");
            diagnostics.cyclic_comments += emitted;
        }
    }

    rows
}

/// Emit `root` and its replies, depth first.
fn emit_thread<'a>(
    root: &'a str,
    reconciled: &Reconciliation<'a>,
    index: &ThreadIndex<'a>,
    seen: &mut HashSet<&'a str>,
    rows: &mut Vec<CommentRow>,
) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Some(record) = reconciled.get(id) else {
            continue;
        };
        rows.push(CommentRow::from(record));
        // Reversed so the first child is popped first.
        stack.extend(index.children(id).iter().rev().copied());
    }
}
