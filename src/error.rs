/// Error types for comment extraction and report writing.
///
/// Only conditions that make the whole run meaningless are errors. Data-integrity
/// problems inside otherwise readable parts (missing attributes, dangling reply
/// links, unknown paragraph ids) are repaired locally and tallied in
/// [`Diagnostics`](crate::Diagnostics) instead.
use crate::package::PartKind;
use thiserror::Error;

/// Result type for comment extraction.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for comment extraction.
#[derive(Error, Debug)]
pub enum Error {
    /// One of the three required parts is not well-formed markup
    #[error("Malformed input in {part}: {reason}")]
    MalformedInput { part: PartKind, reason: String },

    /// A required part is absent from the package
    #[error("Malformed input: required part {0} is missing from the package")]
    MissingPart(PartKind),

    /// The container could not be opened or read
    #[error("Package error: {0}")]
    Package(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The report writer failed
    #[error("Write error: {0}")]
    Write(String),
}

impl Error {
    /// Build a [`Error::MalformedInput`] for the given part.
    pub(crate) fn malformed(part: PartKind, reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            part,
            reason: reason.into(),
        }
    }

    /// The part this error is attributed to, if any.
    pub fn part(&self) -> Option<PartKind> {
        match self {
            Error::MalformedInput { part, .. } => Some(*part),
            Error::MissingPart(part) => Some(*part),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Package(err.to_string())
    }
}
