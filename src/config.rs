/// Configuration types for comment extraction.
///
/// This module defines the options that control how comment records are
/// assembled and how the reconciled values are rendered into report cells.
/// Output presentation (file format, delimiters, column widths) lives in
/// [`WriterOptions`](crate::report::writer::WriterOptions).
/// Configuration options for building a comment report.
///
/// # Examples
///
/// ```rust
/// use docx_comments::{AnchorScope, ReportOptions};
///
/// // Create with defaults
/// let options = ReportOptions::default();
///
/// // Or customize
/// let options = ReportOptions::new()
///     .with_anchor_scope(AnchorScope::Document)
///     .with_run_separator("\n")
///     .with_initials(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Value substituted for an absent author, initials or date attribute
    pub missing_sentinel: String,
    /// Value written in the "Reply To" column of comments that are not replies
    pub reply_to_sentinel: String,
    /// Which runs count as anchored text
    pub anchor_scope: AnchorScope,
    /// Inserted between consecutive runs of anchored text
    pub run_separator: String,
    /// Inserted between paragraphs of a comment body
    pub paragraph_separator: String,
    /// Whether to report an "Initials" column after "Author"
    pub include_initials: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            missing_sentinel: "MISSING".to_string(),
            reply_to_sentinel: "n/a".to_string(),
            anchor_scope: AnchorScope::Sibling,
            run_separator: String::new(),
            paragraph_separator: "\n".to_string(),
            include_initials: false,
        }
    }
}

impl ReportOptions {
    /// Create a new `ReportOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value substituted for missing authorship attributes.
    #[inline]
    pub fn with_missing_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.missing_sentinel = sentinel.into();
        self
    }

    /// Set the "Reply To" value used for comments that are not replies.
    #[inline]
    pub fn with_reply_to_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.reply_to_sentinel = sentinel.into();
        self
    }

    /// Set the anchored-text collection rule.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use docx_comments::{AnchorScope, ReportOptions};
    ///
    /// let options = ReportOptions::new().with_anchor_scope(AnchorScope::Document);
    /// assert_eq!(options.anchor_scope, AnchorScope::Document);
    /// ```
    #[inline]
    pub fn with_anchor_scope(mut self, scope: AnchorScope) -> Self {
        self.anchor_scope = scope;
        self
    }

    /// Set the separator inserted between anchored runs.
    #[inline]
    pub fn with_run_separator(mut self, separator: impl Into<String>) -> Self {
        self.run_separator = separator.into();
        self
    }

    /// Set the separator inserted between paragraphs of a comment body.
    #[inline]
    pub fn with_paragraph_separator(mut self, separator: impl Into<String>) -> Self {
        self.paragraph_separator = separator.into();
        self
    }

    /// Set whether the report carries an "Initials" column.
    #[inline]
    pub fn with_initials(mut self, include: bool) -> Self {
        self.include_initials = include;
        self
    }
}

/// Rules for deciding which runs belong to a comment's anchored text.
///
/// Both rules only take runs that end before the matching
/// `w:commentRangeEnd`. They differ in where a run may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum AnchorScope {
    /// Runs that are later siblings of the `w:commentRangeStart` marker.
    ///
    /// Runs nested in other containers (hyperlinks, later paragraphs) are not
    /// collected, and entirely empty paragraphs contribute nothing.
    #[default]
    Sibling,

    /// Every run that starts after the start marker in document order,
    /// wherever it is nested.
    Document,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_options_builder() {
        let options = ReportOptions::new()
            .with_missing_sentinel("?")
            .with_reply_to_sentinel("-")
            .with_anchor_scope(AnchorScope::Document)
            .with_run_separator(" ")
            .with_paragraph_separator(" / ")
            .with_initials(true);

        assert_eq!(options.missing_sentinel, "?");
        assert_eq!(options.reply_to_sentinel, "-");
        assert_eq!(options.anchor_scope, AnchorScope::Document);
        assert_eq!(options.run_separator, " ");
        assert_eq!(options.paragraph_separator, " / ");
        assert!(options.include_initials);
    }

    #[test]
    fn test_report_options_default() {
        let options = ReportOptions::default();
        assert_eq!(options.missing_sentinel, "MISSING");
        assert_eq!(options.reply_to_sentinel, "n/a");
        assert_eq!(options.anchor_scope, AnchorScope::Sibling);
        assert!(options.run_separator.is_empty());
        assert_eq!(options.paragraph_separator, "\n");
        assert!(!options.include_initials);
    }
}
