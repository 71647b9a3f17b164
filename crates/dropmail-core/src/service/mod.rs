//! Services for delivering messages.
//!
//! [`gmail`] talks to the mail API; [`upload`] turns uploaded files into
//! messages and hands them to any [`MessageSender`].

pub mod gmail;
pub mod upload;

pub use gmail::{GmailClient, MessageSender, SentMessage};
pub use upload::UploadMailer;
