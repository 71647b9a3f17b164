//! Error types for MIME operations.

use std::io;
use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required envelope field is empty.
    #[error("Missing required field: {0}")]
    EmptyField(&'static str),

    /// A header value contains a character that would break the header block.
    #[error("Invalid {field} header value: control character {found:?} at byte {position}")]
    InvalidHeaderValue {
        /// Field the value belongs to (e.g., "subject").
        field: &'static str,
        /// Offending character.
        found: char,
        /// Byte offset of the offending character.
        position: usize,
    },

    /// A caller-supplied multipart boundary is unusable.
    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    /// Attachment bytes could not be read.
    #[error("Unable to read attachment {name:?}: {source}")]
    AttachmentRead {
        /// Attachment file name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Line chunking was asked for a zero-width line.
    #[error("Chunk limit must be greater than zero")]
    InvalidChunkLimit,

    /// Random tokens must have at least one character.
    #[error("Token length must be greater than zero")]
    InvalidTokenLength,

    /// Unknown random alphabet kind.
    #[error("Unknown alphabet kind: {0:?} (expected alphanum, alpha or number)")]
    UnknownAlphabet(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),

    /// Missing boundary in multipart message.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// Invalid multipart structure.
    #[error("Invalid multipart structure: {0}")]
    InvalidMultipart(String),
}

impl Error {
    /// Creates an attachment read error.
    #[must_use]
    pub fn attachment_read(name: impl Into<String>, source: io::Error) -> Self {
        Self::AttachmentRead {
            name: name.into(),
            source,
        }
    }

    /// Returns true if the error was caused by caller input rather than I/O.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyField(_) | Self::InvalidHeaderValue { .. } | Self::InvalidBoundary(_)
        )
    }
}
