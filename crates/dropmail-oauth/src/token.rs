//! `OAuth2` token types.
//!
//! [`Token`] serializes to the same JSON shape as Go's `oauth2.Token`
//! (`access_token`, `token_type`, `refresh_token`, `expiry`), so tokens cached
//! by other Google tooling can be loaded unchanged.

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Seconds before the real expiry at which a token is treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// `OAuth2` access token with optional refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Token {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// When the access token expires.
    #[serde(
        default,
        deserialize_with = "deserialize_expiry",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry: Option<DateTime<Utc>>,
    /// Refresh token for obtaining new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scope granted by authorization server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Reads Go's zero time (`0001-01-01T00:00:00Z`) as "no expiry".
fn deserialize_expiry<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let expiry = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(expiry.filter(|expiry| expiry.year() > 1))
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expiry: None,
            refresh_token: None,
            scope: None,
        }
    }

    /// Creates a token from a token endpoint response.
    #[must_use]
    pub fn from_response(response: TokenResponse) -> Self {
        let expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(i64::from(secs)));

        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expiry,
            refresh_token: response.refresh_token,
            scope: response.scope,
        }
    }

    /// Parses a token from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the token to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks if the token is expired, treating the last minute as expired.
    ///
    /// Tokens without an expiry never expire.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiry
            .is_some_and(|exp| Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= exp)
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Sets the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Returns the refresh token if available.
    ///
    /// # Errors
    ///
    /// Returns an error if no refresh token is available.
    pub fn refresh_token(&self) -> Result<&str> {
        self.refresh_token.as_deref().ok_or(Error::NoRefreshToken)
    }

    /// Returns the `Authorization` header value for this token.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Token response from `OAuth2` server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expires in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u32>,
    /// Refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Error response from `OAuth2` server.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub error_description: String,
}

impl ErrorResponse {
    /// Converts to an Error.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::oauth_error(self.error, self.error_description)
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
    fn test_token_creation() {
        let token = Token::new("access123", "Bearer");
        assert_eq!(token.access_token, "access123");
        assert!(token.expiry.is_none());
        assert!(!token.is_expired());
        assert!(matches!(token.refresh_token(), Err(Error::NoRefreshToken)));
    }

    #[test]
    fn test_token_expiration() {
        let expired =
            Token::new("access123", "Bearer").with_expiry(Utc::now() - Duration::seconds(120));
        assert!(expired.is_expired());

        // Inside the skew window counts as expired.
        let expiring =
            Token::new("access123", "Bearer").with_expiry(Utc::now() + Duration::seconds(30));
        assert!(expiring.is_expired());

        let valid =
            Token::new("access123", "Bearer").with_expiry(Utc::now() + Duration::seconds(3600));
        assert!(!valid.is_expired());
    }

    #[test]
    fn test_token_from_response() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"ya29.a0","expires_in":3599,"scope":"https://www.googleapis.com/auth/gmail.send","token_type":"Bearer"}"#,
        )
        .unwrap();

        let token = Token::from_response(response);
        assert_eq!(token.access_token, "ya29.a0");
        assert!(token.expiry.is_some());
        assert!(token.refresh_token.is_none());
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_json_shape() {
        let token = Token::from_json(
            r#"{"access_token":"ya29.x","token_type":"Bearer","refresh_token":"1//r","expiry":"2024-05-01T10:00:00.123456+02:00"}"#,
        )
        .unwrap();
        assert_eq!(token.refresh_token().unwrap(), "1//r");
        assert_eq!(
            token.expiry.unwrap().to_rfc3339(),
            "2024-05-01T08:00:00.123456+00:00"
        );
        assert!(token.is_expired());

        let json: serde_json::Value = serde_json::from_str(&token.to_json().unwrap()).unwrap();
        assert_eq!(json["access_token"], "ya29.x");
        assert!(json.get("expiry").is_some());
        assert!(json.get("scope").is_none());
    }

    #[test]
    fn test_token_zero_expiry() {
        let token = Token::from_json(
            r#"{"access_token":"a","token_type":"Bearer","refresh_token":"1//r","expiry":"0001-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(token.expiry.is_none());
        assert!(!token.is_expired());

        let token = Token::from_json(r#"{"access_token":"a","expiry":null}"#).unwrap();
        assert!(token.expiry.is_none());
    }

    #[test]
    fn test_token_defaults_bearer() {
        let token = Token::from_json(r#"{"access_token":"a"}"#).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.authorization_header(), "Bearer a");
    }
}
