//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Message could not be built.
    #[error("MIME error: {0}")]
    Mime(#[from] dropmail_mime::Error),

    /// Authorization failed.
    #[error("OAuth error: {0}")]
    OAuth(#[from] dropmail_oauth::Error),

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The mail API rejected the request.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API, or the raw body.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if an attachment could not be read.
    #[must_use]
    pub const fn is_attachment_read(&self) -> bool {
        matches!(self, Self::Mime(dropmail_mime::Error::AttachmentRead { .. }))
    }

    /// Returns true if the failure was caused by the message contents.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        match self {
            Self::Mime(e) => e.is_input_error(),
            _ => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
