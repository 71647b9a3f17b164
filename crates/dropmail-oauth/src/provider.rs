//! `OAuth2` provider configurations.

use crate::error::{Error, Result};
use url::Url;

/// Scope allowing messages to be sent, and nothing else.
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// Google authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            default_scopes: Vec::new(),
        })
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Google provider limited to sending mail.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new("Google", GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL)?
            .with_default_scopes(vec![GMAIL_SEND_SCOPE.to_string()]))
    }

    /// Returns true for Google endpoints, which need extra parameters to
    /// issue refresh tokens.
    #[must_use]
    pub fn is_google(&self) -> bool {
        self.name == "Google" || self.auth_url.host_str() == Some("accounts.google.com")
    }

    /// Validates that the endpoints can carry credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint has no host or uses an unsupported scheme.
    pub fn validate(&self) -> Result<()> {
        for (label, url) in [("auth_url", &self.auth_url), ("token_url", &self.token_url)] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::InvalidConfig(format!(
                    "{label} must be http or https, got {}",
                    url.scheme()
                )));
            }
            if url.host_str().is_none_or(str::is_empty) {
                return Err(Error::InvalidConfig(format!("{label} has no host")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_google_provider() {
        let provider = Provider::google().unwrap();
        assert_eq!(provider.name, "Google");
        assert_eq!(provider.default_scopes, [GMAIL_SEND_SCOPE]);
        assert!(provider.is_google());
        provider.validate().unwrap();
    }

    #[test]
    fn test_custom_provider() {
        let provider = Provider::new(
            "Custom",
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
        )
        .unwrap()
        .with_default_scopes(vec!["send".to_string()]);

        assert_eq!(provider.name, "Custom");
        assert!(!provider.is_google());
        assert_eq!(provider.default_scopes.len(), 1);
        provider.validate().unwrap();
    }

    #[test]
    fn test_invalid_url() {
        assert!(Provider::new("Bad", "not a url", "https://example.com/token").is_err());
    }

    #[test]
    fn test_validate_scheme() {
        let provider = Provider::new(
            "Files",
            "file:///tmp/authorize",
            "https://example.com/token",
        )
        .unwrap();
        assert!(matches!(provider.validate(), Err(Error::InvalidConfig(_))));
    }
}
