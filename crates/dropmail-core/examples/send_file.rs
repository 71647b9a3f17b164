//! Example: mail a file through the Gmail API
//!
//! ## Prerequisites
//!
//! 1. Create an OAuth client of type "Desktop app" in the Google Cloud
//!    console and download it as `client_secret.json`.
//! 2. Write a mailer configuration:
//!    ```json
//!    {"from": "me@gmail.com", "to": "you@example.com", "subject": "New upload"}
//!    ```
//!
//! ## Running
//!
//! ```bash
//! DROPMAIL_CONFIG=mailer.json cargo run --example send_file -- report.pdf
//! ```
//!
//! Without `token.json` the example walks through the consent flow and
//! prints the token JSON to save for later runs.

use anyhow::Context;
use dropmail_core::{GmailClient, GmailConfig, MailerConfig, UploadMailer};
use dropmail_oauth::{AuthorizationCodeFlow, ClientSecret, OAuthClient, Token};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const TOKEN_FILE: &str = "token.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dropmail_core=debug,dropmail_oauth=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let file = env::args()
        .nth(1)
        .context("usage: send_file <path-to-upload>")?;
    let config_path = env::var("DROPMAIL_CONFIG").unwrap_or_else(|_| "mailer.json".into());
    let secret_path =
        env::var("DROPMAIL_CLIENT_SECRET").unwrap_or_else(|_| "client_secret.json".into());

    let config = MailerConfig::from_file(&config_path)
        .with_context(|| format!("Unable to read mailer config {config_path}"))?;
    let oauth = ClientSecret::from_file(&secret_path)
        .and_then(ClientSecret::into_client)
        .with_context(|| format!("Unable to parse client secret file {secret_path}"))?;

    let token = if Path::new(TOKEN_FILE).exists() {
        Token::from_json(&std::fs::read_to_string(TOKEN_FILE)?)?
    } else {
        token_from_web(oauth.clone()).await?
    };

    let gmail = GmailClient::new(token, GmailConfig::default())?.with_oauth(oauth);
    let mailer = UploadMailer::new(config, gmail)?;

    let sent = mailer.deliver_file(&file).await?;
    info!(id = %sent.id, file = %file, "Upload mailed");

    Ok(())
}

/// Runs the consent flow in the terminal.
async fn token_from_web(client: OAuthClient) -> anyhow::Result<Token> {
    let flow = AuthorizationCodeFlow::new(client).with_pkce();
    let url = flow.authorization_url(None, Some("state-token"))?;

    println!("Go to the following link in your browser then type the authorization code:");
    println!("\n{url}\n");
    print!("Code: ");
    io::stdout().flush()?;

    let mut code = String::new();
    io::stdin().lock().read_line(&mut code)?;

    let token = flow
        .exchange_code(&code, None)
        .await
        .context("Unable to retrieve token from web")?;

    println!("\nSave this as {TOKEN_FILE} to skip the browser next time:");
    println!("{}", token.to_json()?);
    Ok(token)
}
