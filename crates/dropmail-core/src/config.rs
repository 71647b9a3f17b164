//! Mailer and transport configuration.

use crate::error::{Error, Result};
use dropmail_mime::EmailEnvelope;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default body of upload notifications.
pub const DEFAULT_BODY: &str = "You just uploaded this file!";

/// Gmail user id meaning "the authorized account".
pub const DEFAULT_USER_ID: &str = "me";

/// Default Gmail API endpoint.
pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com";

fn default_body() -> String {
    DEFAULT_BODY.to_string()
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Who uploads are mailed to, and what the message says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailerConfig {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Text part sent alongside each attachment.
    #[serde(default = "default_body")]
    pub body: String,
}

impl MailerConfig {
    /// Creates a configuration with the default body.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: default_body(),
        }
    }

    /// Sets the message body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a required field is missing.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Builds and validates the message envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is empty or contains control characters.
    pub fn envelope(&self) -> Result<EmailEnvelope> {
        let envelope = EmailEnvelope::new(&self.from, &self.to, &self.subject);
        envelope.validate()?;
        Ok(envelope)
    }
}

/// Gmail API transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmailConfig {
    /// API base URL, without a trailing path.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Gmail user whose mailbox sends the message.
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_id: default_user_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GmailConfig {
    /// Sets the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the Gmail user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the `messages.send` endpoint for the configured user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user id is empty.
    pub fn send_url(&self) -> Result<String> {
        let user_id = self.user_id.trim();
        if user_id.is_empty() {
            return Err(Error::Config("user_id must not be empty".into()));
        }
        Ok(format!(
            "{}/gmail/v1/users/{user_id}/messages/send",
            self.api_base.trim_end_matches('/')
        ))
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
    fn test_mailer_config_defaults() {
        let config =
            MailerConfig::from_json(r#"{"from":"a@x.com","to":"b@x.com","subject":"Upload"}"#)
                .unwrap();
        assert_eq!(config.body, DEFAULT_BODY);
        assert_eq!(config, MailerConfig::new("a@x.com", "b@x.com", "Upload"));
    }

    #[test]
    fn test_mailer_config_missing_field() {
        let err = MailerConfig::from_json(r#"{"from":"a@x.com","to":"b@x.com"}"#).unwrap_err();
        assert!(matches!(err, Error::Serde(_)));
    }

    #[test]
    fn test_envelope_validation() {
        let config = MailerConfig::new("a@x.com", "b@x.com", "Upload");
        let envelope = config.envelope().unwrap();
        assert_eq!(envelope.subject, "Upload");

        let err = MailerConfig::new("a@x.com", "", "Upload").envelope().unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_mailer_config_ignores_user_id() {
        // The sending mailbox belongs to the transport settings.
        let config = MailerConfig::from_json(
            r#"{"from":"a@x.com","to":"b@x.com","subject":"Upload","user_id":"x"}"#,
        )
        .unwrap();
        assert_eq!(config, MailerConfig::new("a@x.com", "b@x.com", "Upload"));
    }

    #[test]
    fn test_gmail_config() {
        let config = GmailConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.user_id, "me");
        assert_eq!(
            config.send_url().unwrap(),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/send"
        );

        let config: GmailConfig = serde_json::from_str(
            r#"{"api_base":"http://127.0.0.1:9000/","user_id":"someone@x.com"}"#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(
            config.send_url().unwrap(),
            "http://127.0.0.1:9000/gmail/v1/users/someone@x.com/messages/send"
        );
    }

    #[test]
    fn test_gmail_config_empty_user_id() {
        let err = GmailConfig::default().with_user_id(" ").send_url().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
