//! Authorization Code Flow implementation.

use super::{OAuthClient, PkceChallenge};
use crate::error::Result;
use crate::token::Token;
use tracing::info;
use url::Url;

/// Authorization Code Flow for `OAuth2`.
///
/// The user opens [`authorization_url`](Self::authorization_url) in a
/// browser and pastes back the code, which is exchanged for a token.
#[derive(Debug)]
pub struct AuthorizationCodeFlow {
    client: OAuthClient,
    pkce: Option<PkceChallenge>,
}

impl AuthorizationCodeFlow {
    /// Creates a new authorization code flow.
    #[must_use]
    pub const fn new(client: OAuthClient) -> Self {
        Self { client, pkce: None }
    }

    /// Enables PKCE.
    #[must_use]
    pub fn with_pkce(mut self) -> Self {
        self.pkce = Some(PkceChallenge::generate());
        self
    }

    /// Builds the authorization URL for user consent.
    ///
    /// # Arguments
    ///
    /// * `scopes` - Scopes to request (uses provider defaults if None)
    /// * `state` - Optional state parameter for CSRF protection
    ///
    /// # Errors
    ///
    /// Returns an error if the provider endpoints are unusable.
    pub fn authorization_url(&self, scopes: Option<&[String]>, state: Option<&str>) -> Result<Url> {
        let provider = &self.client.provider;
        provider.validate()?;

        let mut url = provider.auth_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.client.client_id)
                .append_pair("response_type", "code");

            if let Some(redirect_uri) = &self.client.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }

            let scope = scopes.unwrap_or(provider.default_scopes.as_slice()).join(" ");
            if !scope.is_empty() {
                pairs.append_pair("scope", &scope);
            }

            if let Some(state) = state {
                pairs.append_pair("state", state);
            }

            if let Some(pkce) = &self.pkce {
                pairs
                    .append_pair("code_challenge", pkce.challenge())
                    .append_pair("code_challenge_method", pkce.method());
            }

            // Google only returns a refresh token for offline access
            if provider.is_google() {
                pairs
                    .append_pair("access_type", "offline")
                    .append_pair("prompt", "consent");
            }
        }

        Ok(url)
    }

    /// Exchanges the authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(&self, code: &str, redirect_uri: Option<&str>) -> Result<Token> {
        let code_verifier = self.pkce.as_ref().map(PkceChallenge::verifier);
        let token = self
            .client
            .exchange_code(code.trim(), redirect_uri, code_verifier)
            .await?;

        info!(
            provider = %self.client.provider.name,
            has_refresh_token = token.refresh_token.is_some(),
            "Authorization code exchanged"
        );
        Ok(token)
    }

    /// Returns the PKCE verifier if PKCE is enabled.
    #[must_use]
    pub fn pkce_verifier(&self) -> Option<&str> {
        self.pkce.as_ref().map(PkceChallenge::verifier)
    }

    /// Returns the underlying client, for refreshing tokens later.
    #[must_use]
    pub fn into_client(self) -> OAuthClient {
        self.client
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
    use crate::provider::Provider;
    use mockito::{Matcher, Server};

    #[test]
    fn test_authorization_url() {
        let provider = Provider::google().unwrap();
        let client =
            OAuthClient::new("test_client", provider).with_redirect_uri("http://localhost:8080");

        let flow = AuthorizationCodeFlow::new(client);
        let url = flow.authorization_url(None, Some("state-token")).unwrap();

        assert!(url.as_str().starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.as_str().contains("client_id=test_client"));
        assert!(url.as_str().contains("response_type=code"));
        assert!(url.as_str().contains("state=state-token"));
        assert!(
            url.as_str()
                .contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080")
        );
        assert!(
            url.as_str()
                .contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fgmail.send")
        );
        assert!(url.as_str().contains("access_type=offline"));
        assert!(url.as_str().contains("prompt=consent"));
    }

    #[test]
    fn test_authorization_url_with_pkce() {
        let provider = Provider::google().unwrap();
        let flow =
            AuthorizationCodeFlow::new(OAuthClient::new("test_client", provider)).with_pkce();
        let url = flow.authorization_url(None, None).unwrap();

        let challenge = url
            .query_pairs()
            .find(|(k, _)| k == "code_challenge")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let verifier = flow.pkce_verifier().unwrap();
        assert_eq!(challenge, PkceChallenge::from_verifier(verifier).challenge());
        assert!(url.as_str().contains("code_challenge_method=S256"));
    }

    #[test]
    fn test_authorization_url_custom_scopes() {
        let provider = Provider::new(
            "Custom",
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
        )
        .unwrap();
        let flow = AuthorizationCodeFlow::new(OAuthClient::new("test_client", provider));
        let scopes = vec!["email".to_string(), "profile".to_string()];
        let url = flow.authorization_url(Some(&scopes), None).unwrap();

        assert!(url.as_str().contains("scope=email+profile"));
        assert!(!url.as_str().contains("access_type"));
    }

    #[tokio::test]
    async fn test_exchange_code_sends_verifier() {
        let mut server = Server::new_async().await;
        let provider = Provider::new(
            "Test",
            format!("{}/auth", server.url()),
            format!("{}/token", server.url()),
        )
        .unwrap();
        let client =
            OAuthClient::new("client-1", provider).with_redirect_uri("urn:ietf:wg:oauth:2.0:oob");
        let flow = AuthorizationCodeFlow::new(client).with_pkce();

        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("code".into(), "4/abc".into()),
                Matcher::UrlEncoded("redirect_uri".into(), "urn:ietf:wg:oauth:2.0:oob".into()),
                Matcher::UrlEncoded(
                    "code_verifier".into(),
                    flow.pkce_verifier().unwrap().to_string(),
                ),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"a","token_type":"Bearer","refresh_token":"1//r","expires_in":3599}"#)
            .create_async()
            .await;

        let token = flow.exchange_code(" 4/abc\n", None).await.unwrap();
        mock.assert_async().await;
        assert_eq!(token.refresh_token.as_deref(), Some("1//r"));
    }
}
