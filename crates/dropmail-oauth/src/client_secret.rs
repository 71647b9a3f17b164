//! Google `client_secret.json` loading.
//!
//! The file downloaded from the Cloud console wraps the credentials in an
//! `installed` (desktop) or `web` section.

use crate::error::{Error, Result};
use crate::flow::OAuthClient;
use crate::provider::{GMAIL_SEND_SCOPE, Provider};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// OAuth client credentials from a `client_secret.json` file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    /// Client ID.
    pub client_id: String,
    /// Client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Authorization endpoint.
    pub auth_uri: String,
    /// Token endpoint.
    pub token_uri: String,
    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Parses the contents of a `client_secret.json` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or has neither an
    /// `installed` nor a `web` section.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(json)?;
        file.installed.or(file.web).ok_or_else(|| {
            Error::InvalidConfig("client secret has no \"installed\" or \"web\" section".into())
        })
    }

    /// Reads and parses a `client_secret.json` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading client secret");
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Builds a client requesting the Gmail send scope.
    ///
    /// The first registered redirect URI is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints are not valid URLs.
    pub fn into_client(self) -> Result<OAuthClient> {
        let provider = Provider::new("Google", &self.auth_uri, &self.token_uri)?
            .with_default_scopes(vec![GMAIL_SEND_SCOPE.to_string()]);

        let mut client = OAuthClient::new(self.client_id, provider);
        if let Some(secret) = self.client_secret {
            client = client.with_client_secret(secret);
        }
        if let Some(uri) = self.redirect_uris.into_iter().next() {
            client = client.with_redirect_uri(uri);
        }
        Ok(client)
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

    const INSTALLED: &str = r#"{
        "installed": {
            "client_id": "123-abc.apps.googleusercontent.com",
            "project_id": "dropmail-test",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "auth_provider_x509_cert_url": "https://www.googleapis.com/oauth2/v1/certs",
            "client_secret": "GOCSPX-secret",
            "redirect_uris": ["urn:ietf:wg:oauth:2.0:oob", "http://localhost"]
        }
    }"#;

    #[test]
    fn test_installed_section() {
        let secret = ClientSecret::from_json(INSTALLED).unwrap();
        assert_eq!(secret.client_id, "123-abc.apps.googleusercontent.com");
        assert_eq!(secret.client_secret.as_deref(), Some("GOCSPX-secret"));

        let client = secret.into_client().unwrap();
        assert_eq!(client.redirect_uri.as_deref(), Some("urn:ietf:wg:oauth:2.0:oob"));
        assert_eq!(client.provider.default_scopes, [GMAIL_SEND_SCOPE]);
        assert!(client.provider.is_google());
    }

    #[test]
    fn test_web_section() {
        let json = r#"{"web":{"client_id":"web-id","auth_uri":"https://accounts.google.com/o/oauth2/auth","token_uri":"https://oauth2.googleapis.com/token"}}"#;
        let client = ClientSecret::from_json(json).unwrap().into_client().unwrap();
        assert_eq!(client.client_id, "web-id");
        assert!(client.client_secret.is_none());
        assert!(client.redirect_uri.is_none());
    }

    #[test]
    fn test_missing_section() {
        assert!(matches!(
            ClientSecret::from_json(r#"{"other":{}}"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ClientSecret::from_json("not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ClientSecret::from_file("/nonexistent/client_secret.json"),
            Err(Error::Io(_))
        ));
    }
}
