//! # dropmail-oauth
//!
//! `OAuth2` for sending mail through the Gmail API.
//!
//! ## Features
//!
//! - **Authorization flow**: Authorization Code Flow with optional PKCE
//! - **Token management**: Refresh, expiration checking, JSON persistence format
//! - **Client secrets**: Load Google's `client_secret.json`
//!
//! ## Quick Start
//!
//! ```ignore
//! use dropmail_oauth::{AuthorizationCodeFlow, ClientSecret};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientSecret::from_file("client_secret.json")?.into_client()?;
//!     let flow = AuthorizationCodeFlow::new(client).with_pkce();
//!
//!     println!("Visit: {}", flow.authorization_url(None, Some("state-token"))?);
//!
//!     let code = "authorization_code_from_browser";
//!     let token = flow.exchange_code(code, None).await?;
//!     println!("{}", token.to_json()?);
//!     Ok(())
//! }
//! ```
//!
//! ### Token Refresh
//!
//! ```ignore
//! if token.is_expired() {
//!     let token = client.refresh_token(&token).await?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client_secret;
mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use client_secret::ClientSecret;
pub use error::{Error, Result};
pub use flow::{AuthorizationCodeFlow, OAuthClient, PkceChallenge};
pub use provider::{GMAIL_SEND_SCOPE, Provider};
pub use token::Token;
