//! Error types for the PDF engine.
//!
//! Every fallible operation returns [`Result`]. Variants carry the detail a
//! developer needs (byte offsets, object references), while
//! [`Error::category`] collapses them into the five categories a user-facing
//! surface distinguishes.

use crate::object::ObjectRef;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading, mutating or writing a PDF.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Truncated or unparsable structure
    #[error("Malformed PDF at byte {offset}: {reason}")]
    MalformedDocument {
        /// Byte offset where the problem was detected
        offset: usize,
        /// What was wrong
        reason: String,
    },

    /// A reference points at an object that does not exist
    #[error("Dangling reference: {0}")]
    DanglingReference(ObjectRef),

    /// Object has the wrong type for where it was used
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Feature present in the file that the engine does not handle
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Caller-supplied parameters were rejected before any mutation
    #[error("Invalid parameters: {0}")]
    Validation(String),

    /// The supplied password did not authenticate
    #[error("Incorrect password")]
    Authentication,

    /// Page index past the end of the document
    #[error("Page index {index} out of range (document has {count} pages)")]
    IndexOutOfRange {
        /// Requested zero-based index
        index: usize,
        /// Number of pages
        count: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::MalformedDocument`].
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedDocument {
            offset,
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`Error::InvalidObjectType`].
    pub fn wrong_type(expected: &str, found: &str) -> Self {
        Error::InvalidObjectType {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// The user-facing category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MalformedDocument { .. }
            | Error::DanglingReference(_)
            | Error::InvalidObjectType { .. }
            | Error::Io(_) => ErrorCategory::Malformed,
            Error::Unsupported(_) => ErrorCategory::Unsupported,
            Error::Validation(_) | Error::IndexOutOfRange { .. } => ErrorCategory::Validation,
            Error::Authentication => ErrorCategory::Authentication,
        }
    }
}

/// Coarse error categories surfaced to users.
///
/// Authentication is kept apart from the rest so a UI can prompt for the
/// password again instead of reporting a broken file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorCategory {
    /// The file is broken
    Malformed,
    /// The file uses something the engine cannot handle
    Unsupported,
    /// The request itself was invalid
    Validation,
    /// Wrong password
    Authentication,
}

impl ErrorCategory {
    /// One sentence suitable for showing to an end user.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorCategory::Malformed => "The file is damaged or is not a valid PDF.",
            ErrorCategory::Unsupported => "The file uses a PDF feature that is not supported.",
            ErrorCategory::Validation => "The requested operation has invalid settings.",
            ErrorCategory::Authentication => "The password is incorrect.",
        }
    }
}
