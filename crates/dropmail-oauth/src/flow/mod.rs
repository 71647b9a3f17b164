//! `OAuth2` authorization flows.

mod code;
mod pkce;

pub use code::AuthorizationCodeFlow;
pub use pkce::{PKCE_METHOD, PkceChallenge};

use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::{ErrorResponse, Token, TokenResponse};
use reqwest::Client;
use tracing::{debug, warn};

/// Common `OAuth2` client configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (optional for public clients).
    pub client_secret: Option<String>,
    /// Redirect URI for authorization code flow.
    pub redirect_uri: Option<String>,
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            provider,
            http_client: Client::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Uses a preconfigured HTTP client (shared pool, timeouts, proxy).
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Refreshes an access token using its refresh token.
    ///
    /// The previous refresh token is kept when the server does not issue a
    /// new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails or if the token has no refresh token.
    pub async fn refresh_token(&self, token: &Token) -> Result<Token> {
        let refresh_token = token.refresh_token()?;
        debug!(provider = %self.provider.name, "Refreshing access token");

        let mut new_token = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        if new_token.refresh_token.is_none() {
            new_token.refresh_token.clone_from(&token.refresh_token);
        }

        Ok(new_token)
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub(crate) async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        code_verifier: Option<&str>,
    ) -> Result<Token> {
        debug!(
            provider = %self.provider.name,
            pkce = code_verifier.is_some(),
            "Exchanging authorization code"
        );

        let mut params = vec![("grant_type", "authorization_code"), ("code", code)];
        if let Some(uri) = redirect_uri.or(self.redirect_uri.as_deref()) {
            params.push(("redirect_uri", uri));
        }
        if let Some(verifier) = code_verifier {
            params.push(("code_verifier", verifier));
        }

        self.request_token(&params).await
    }

    /// Posts a grant to the token endpoint, adding client credentials.
    async fn request_token(&self, grant: &[(&str, &str)]) -> Result<Token> {
        let mut params: Vec<(&str, &str)> = grant.to_vec();
        params.push(("client_id", self.client_id.as_str()));
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Token endpoint rejected request");
            return Err(serde_json::from_str::<ErrorResponse>(&body).map_or_else(
                |_| Error::InvalidResponse {
                    status: status.as_u16(),
                    body,
                },
                ErrorResponse::into_error,
            ));
        }

        let token_response: TokenResponse = serde_json::from_str(&body)?;
        Ok(Token::from_response(token_response))
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
    use mockito::{Matcher, Server};

    fn client_for(server: &Server) -> OAuthClient {
        let provider = Provider::new(
            "Test",
            format!("{}/auth", server.url()),
            format!("{}/token", server.url()),
        )
        .unwrap();
        OAuthClient::new("client-1", provider).with_client_secret("shh")
    }

    #[test]
    fn test_oauth_client_with_secret() {
        let provider = Provider::google().unwrap();
        let client = OAuthClient::new("test_client_id", provider)
            .with_client_secret("secret")
            .with_redirect_uri("http://localhost:8080");

        assert_eq!(client.client_id, "test_client_id");
        assert_eq!(client.client_secret.as_deref(), Some("secret"));
        assert_eq!(
            client.redirect_uri.as_deref(),
            Some("http://localhost:8080")
        );
    }

    #[test]
    fn test_refresh_without_refresh_token() {
        let client = OAuthClient::new("id", Provider::google().unwrap());
        let token = Token::new("expired", "Bearer");
        let result = tokio_test::block_on(client.refresh_token(&token));
        assert!(matches!(result, Err(Error::NoRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "1//old".into()),
                Matcher::UrlEncoded("client_id".into(), "client-1".into()),
                Matcher::UrlEncoded("client_secret".into(), "shh".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"fresh","token_type":"Bearer","expires_in":3599}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let old = Token::new("stale", "Bearer").with_refresh_token("1//old");
        let token = client.refresh_token(&old).await.unwrap();

        mock.assert_async().await;
        assert_eq!(token.access_token, "fresh");
        assert_eq!(token.refresh_token.as_deref(), Some("1//old"));
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_refresh_takes_rotated_token() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"fresh","token_type":"Bearer","refresh_token":"1//new"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let old = Token::new("stale", "Bearer").with_refresh_token("1//old");
        let token = client.refresh_token(&old).await.unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("1//new"));
    }

    #[tokio::test]
    async fn test_refresh_oauth_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Token has been expired or revoked."}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let old = Token::new("stale", "Bearer").with_refresh_token("1//old");
        let err = client.refresh_token(&old).await.unwrap_err();
        assert!(err.requires_reauthorization());
        assert!(matches!(err, Error::OAuth { ref error, .. } if error == "invalid_grant"));
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = client_for(&server);
        let old = Token::new("stale", "Bearer").with_refresh_token("1//old");
        let err = client.refresh_token(&old).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidResponse { status: 503, ref body } if body == "upstream unavailable"
        ));
    }
}
