//! # dropmail-core
//!
//! Mails uploaded files to a fixed recipient through the Gmail API.
//!
//! This crate provides:
//! - Mailer configuration (`MailerConfig`, `GmailConfig`)
//! - A Gmail `users.messages.send` transport with token refresh
//! - `UploadMailer`, which encodes an upload as an attachment and sends it
//!
//! Message encoding lives in `dropmail-mime`; authorization in
//! `dropmail-oauth`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod service;

pub use config::{GmailConfig, MailerConfig};
pub use error::{Error, Result};
pub use service::{GmailClient, MessageSender, SentMessage, UploadMailer};
