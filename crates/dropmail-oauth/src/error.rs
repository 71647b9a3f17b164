//! Error types for `OAuth2` operations.

use std::io;

/// Result type alias for `OAuth2` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `OAuth2` error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `OAuth2` error from server.
    #[error("OAuth2 error: {error} - {description}")]
    OAuth {
        /// Error code (e.g., `invalid_grant`).
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// Token expired and cannot be refreshed here.
    #[error("Token expired")]
    TokenExpired,

    /// No refresh token available.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The token endpoint answered with something other than a token or an
    /// `OAuth2` error document.
    #[error("Invalid token response ({status}): {body}")]
    InvalidResponse {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl Error {
    /// Creates an OAuth error from error code and description.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            error: error.into(),
            description: description.into(),
        }
    }

    /// Returns true if the user must authorize again to recover.
    #[must_use]
    pub fn requires_reauthorization(&self) -> bool {
        match self {
            Self::NoRefreshToken | Self::TokenExpired => true,
            Self::OAuth { error, .. } => error == "invalid_grant",
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_reauthorization() {
        assert!(Error::NoRefreshToken.requires_reauthorization());
        assert!(
            Error::oauth_error("invalid_grant", "Token has been revoked.")
                .requires_reauthorization()
        );
        assert!(!Error::oauth_error("invalid_client", "").requires_reauthorization());
        assert!(!Error::InvalidConfig("x".into()).requires_reauthorization());
    }

    #[test]
    fn test_display() {
        let err = Error::InvalidResponse {
            status: 502,
            body: "Bad Gateway".into(),
        };
        assert_eq!(err.to_string(), "Invalid token response (502): Bad Gateway");
    }
}
