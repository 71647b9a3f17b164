//! Gmail API transport.
//!
//! Sends encoded messages through `users.messages.send`, refreshing the
//! access token first when it has expired.

use crate::config::GmailConfig;
use crate::error::{Error, Result};
use dropmail_mime::EncodedMessage;
use dropmail_oauth::{OAuthClient, Token};
use serde::Deserialize;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Message accepted by the mail API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    /// Message id.
    pub id: String,
    /// Thread the message was filed under.
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Labels applied to the sent message.
    #[serde(default)]
    pub label_ids: Vec<String>,
}

/// Sends a complete, already encoded message.
pub trait MessageSender: Send + Sync {
    /// Sends the message, returning the accepted message.
    fn send_raw(
        &self,
        message: &EncodedMessage,
    ) -> impl Future<Output = Result<SentMessage>> + Send;
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Gmail API client authorized with an `OAuth2` bearer token.
#[derive(Debug)]
pub struct GmailClient {
    http: reqwest::Client,
    config: GmailConfig,
    token: Mutex<Token>,
    oauth: Option<OAuthClient>,
}

impl GmailClient {
    /// Creates a client sending as the configured Gmail user.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: Token, config: GmailConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            config,
            token: Mutex::new(token),
            oauth: None,
        })
    }

    /// Enables refreshing expired tokens through `client`.
    #[must_use]
    pub fn with_oauth(mut self, client: OAuthClient) -> Self {
        self.oauth = Some(client);
        self
    }

    /// Sets the Gmail user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.config.user_id = user_id.into();
        self
    }

    /// Returns the current token, including any refresh.
    pub async fn token(&self) -> Token {
        self.token.lock().await.clone()
    }

    /// Returns a usable `Authorization` header, refreshing if needed.
    async fn authorization(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if token.is_expired() {
            let Some(oauth) = &self.oauth else {
                return Err(dropmail_oauth::Error::TokenExpired.into());
            };
            *token = oauth.refresh_token(&token).await?;
            info!(expiry = ?token.expiry, "Access token refreshed");
        }
        Ok(token.authorization_header())
    }
}

impl MessageSender for GmailClient {
    async fn send_raw(&self, message: &EncodedMessage) -> Result<SentMessage> {
        let url = self.config.send_url()?;
        let authorization = self.authorization().await?;
        debug!(%url, bytes = message.raw.len(), "Sending message");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body).map_or(body, |b| {
                match b.error.status {
                    Some(code) => format!("{} ({code})", b.error.message),
                    None => b.error.message,
                }
            });
            warn!(status = status.as_u16(), %message, "Gmail rejected message");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SentMessage = serde_json::from_str(&body)?;
        info!(id = %sent.id, "Message sent");
        Ok(sent)
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
    use chrono::{Duration, Utc};
    use dropmail_mime::{EmailEnvelope, encode_plain};
    use dropmail_oauth::Provider;
    use mockito::{Matcher, Server};

    fn message() -> EncodedMessage {
        encode_plain(&EmailEnvelope::new("a@x.com", "b@x.com", "Hi"), "Trial!").unwrap()
    }

    fn fresh_token(access: &str) -> Token {
        Token::new(access, "Bearer").with_expiry(Utc::now() + Duration::hours(1))
    }

    fn client_for(server: &Server, token: Token) -> GmailClient {
        GmailClient::new(token, GmailConfig::default().with_api_base(server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_send_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/gmail/v1/users/me/messages/send")
            .match_header("authorization", "Bearer ya29.good")
            .match_body(Matcher::Json(serde_json::json!({
                "raw": "RnJvbTogYUB4LmNvbQ0KVG86IGJAeC5jb20NClN1YmplY3Q6IEhpDQoNClRyaWFsIQ=="
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"18f0c1","threadId":"18f0c1","labelIds":["SENT"]}"#)
            .create_async()
            .await;

        let client = client_for(&server, fresh_token("ya29.good"));
        let sent = client.send_raw(&message()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(sent.id, "18f0c1");
        assert_eq!(sent.thread_id.as_deref(), Some("18f0c1"));
        assert_eq!(sent.label_ids, ["SENT"]);
    }

    #[tokio::test]
    async fn test_send_custom_user() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/gmail/v1/users/uploads@x.com/messages/send")
            .with_status(200)
            .with_body(r#"{"id":"1"}"#)
            .create_async()
            .await;

        let client = client_for(&server, fresh_token("t")).with_user_id("uploads@x.com");
        let sent = client.send_raw(&message()).await.unwrap();

        mock.assert_async().await;
        assert!(sent.thread_id.is_none());
        assert!(sent.label_ids.is_empty());
    }

    #[tokio::test]
    async fn test_send_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/gmail/v1/users/me/messages/send")
            .with_status(403)
            .with_body(
                r#"{"error":{"code":403,"message":"Request had insufficient authentication scopes.","status":"PERMISSION_DENIED"}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, fresh_token("t"));
        let err = client.send_raw(&message()).await.unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(
                    message,
                    "Request had insufficient authentication scopes. (PERMISSION_DENIED)"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_send_plain_error_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/gmail/v1/users/me/messages/send")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let client = client_for(&server, fresh_token("t"));
        let err = client.send_raw(&message()).await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 502, ref message } if message == "Bad Gateway"));
    }

    #[tokio::test]
    async fn test_expired_token_without_oauth() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/gmail/v1/users/me/messages/send")
            .expect(0)
            .create_async()
            .await;

        let expired = Token::new("old", "Bearer").with_expiry(Utc::now() - Duration::hours(1));
        let client = client_for(&server, expired);
        let err = client.send_raw(&message()).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(
            err,
            Error::OAuth(dropmail_oauth::Error::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let mut server = Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .match_body(Matcher::UrlEncoded(
                "refresh_token".into(),
                "1//keep".into(),
            ))
            .with_status(200)
            .with_body(r#"{"access_token":"ya29.new","token_type":"Bearer","expires_in":3599}"#)
            .create_async()
            .await;
        let send_mock = server
            .mock("POST", "/gmail/v1/users/me/messages/send")
            .match_header("authorization", "Bearer ya29.new")
            .with_status(200)
            .with_body(r#"{"id":"2"}"#)
            .create_async()
            .await;

        let provider = Provider::new(
            "Test",
            format!("{}/auth", server.url()),
            format!("{}/token", server.url()),
        )
        .unwrap();
        let oauth = OAuthClient::new("client-1", provider);
        let expired = Token::new("ya29.old", "Bearer")
            .with_expiry(Utc::now() - Duration::minutes(5))
            .with_refresh_token("1//keep");

        let client = client_for(&server, expired).with_oauth(oauth);
        client.send_raw(&message()).await.unwrap();

        token_mock.assert_async().await;
        send_mock.assert_async().await;

        let token = client.token().await;
        assert_eq!(token.access_token, "ya29.new");
        assert_eq!(token.refresh_token.as_deref(), Some("1//keep"));
    }
}
