//! Mailing of uploaded files.

use super::gmail::{MessageSender, SentMessage};
use crate::config::MailerConfig;
use crate::error::Result;
use dropmail_mime::{Attachment, AttachmentEncoder, EmailEnvelope, encode_plain};
use std::path::Path;
use tracing::{debug, info};

/// Mails each uploaded file to the configured recipient.
#[derive(Debug)]
pub struct UploadMailer<S> {
    config: MailerConfig,
    envelope: EmailEnvelope,
    encoder: AttachmentEncoder,
    sender: S,
}

impl<S: MessageSender> UploadMailer<S> {
    /// Creates a mailer, validating the configuration up front.
    ///
    /// The sending mailbox is chosen by `sender`, not by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope fields are empty or unsafe.
    pub fn new(config: MailerConfig, sender: S) -> Result<Self> {
        let envelope = config.envelope()?;
        Ok(Self {
            config,
            envelope,
            encoder: AttachmentEncoder::new(),
            sender,
        })
    }

    /// Uses a specific attachment encoder, e.g. one with a fixed boundary.
    #[must_use]
    pub fn with_encoder(mut self, encoder: AttachmentEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &MailerConfig {
        &self.config
    }

    /// Returns the underlying sender.
    #[must_use]
    pub const fn sender(&self) -> &S {
        &self.sender
    }

    /// Mails `bytes` as an attachment named `file_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be encoded or sent.
    pub async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> Result<SentMessage> {
        let attachment = Attachment::new(file_name, bytes);
        self.send_attachment(&attachment).await
    }

    /// Reads a file and mails it, named after the file.
    ///
    /// # Errors
    ///
    /// Returns an attachment read error if the file cannot be read, or an
    /// error if the message cannot be encoded or sent.
    pub async fn deliver_file(&self, path: impl AsRef<Path>) -> Result<SentMessage> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            dropmail_mime::Error::attachment_read(path.display().to_string(), e)
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.deliver(&file_name, bytes).await
    }

    /// Sends a text-only message with the configured envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be sent.
    pub async fn notify(&self, content: &str) -> Result<SentMessage> {
        let message = encode_plain(&self.envelope, content)?;
        debug!(to = %self.envelope.to, "Sending notification");
        self.sender.send_raw(&message).await
    }

    async fn send_attachment(&self, attachment: &Attachment) -> Result<SentMessage> {
        info!(
            file_name = attachment.file_name(),
            bytes = attachment.len(),
            mime_type = attachment.detected_mime_type(),
            to = %self.envelope.to,
            "Mailing upload"
        );

        let message = self
            .encoder
            .encode(&self.envelope, &self.config.body, attachment)?;
        self.sender.send_raw(&message).await
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
    use crate::error::Error;
    use dropmail_mime::{Base64Alphabet, EncodedMessage, ParsedMessage};
    use tokio::sync::Mutex;

    /// Records messages instead of sending them.
    #[derive(Debug, Default)]
    struct MemorySender {
        sent: Mutex<Vec<EncodedMessage>>,
        reject: bool,
    }

    impl MemorySender {
        fn rejecting() -> Self {
            Self {
                sent: Mutex::default(),
                reject: true,
            }
        }
    }

    impl MessageSender for MemorySender {
        async fn send_raw(&self, message: &EncodedMessage) -> Result<SentMessage> {
            if self.reject {
                return Err(Error::Api {
                    status: 429,
                    message: "Rate limit exceeded".into(),
                });
            }

            let mut sent = self.sent.lock().await;
            sent.push(message.clone());
            Ok(SentMessage {
                id: format!("msg-{}", sent.len()),
                thread_id: None,
                label_ids: vec!["SENT".into()],
            })
        }
    }

    fn config() -> MailerConfig {
        MailerConfig::new("uploads@x.com", "owner@x.com", "New upload")
    }

    fn mailer() -> UploadMailer<MemorySender> {
        UploadMailer::new(config(), MemorySender::default()).unwrap()
    }

    #[tokio::test]
    async fn test_deliver() {
        let mailer = mailer();
        let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR".to_vec();
        let sent = mailer.deliver("stofication.png", png.clone()).await.unwrap();
        assert_eq!(sent.id, "msg-1");

        let messages = mailer.sender().sent.lock().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].alphabet(), Base64Alphabet::UrlSafe);

        let parsed = ParsedMessage::from_encoded(&messages[0]).unwrap();
        assert_eq!(parsed.from(), Some("uploads@x.com"));
        assert_eq!(parsed.to(), Some("owner@x.com"));
        assert_eq!(parsed.subject(), Some("New upload"));
        assert_eq!(
            parsed.text_part().unwrap().body,
            "You just uploaded this file!\n"
        );

        let file = parsed.attachments().next().unwrap();
        assert_eq!(file.file_name().as_deref(), Some("stofication.png"));
        assert_eq!(file.content_type().unwrap().essence(), "image/png");
        assert_eq!(file.decode_body().unwrap(), png);
    }

    #[tokio::test]
    async fn test_deliver_fixed_boundary() {
        let mailer = UploadMailer::new(config().with_body("Here it is"), MemorySender::default())
            .unwrap()
            .with_encoder(AttachmentEncoder::new().with_boundary("b0undary").unwrap());
        mailer.deliver("a.txt", b"hi".to_vec()).await.unwrap();

        let messages = mailer.sender().sent.lock().await;
        let decoded = String::from_utf8(messages[0].decode().unwrap()).unwrap();
        assert!(decoded.starts_with("Content-Type: multipart/mixed; boundary=b0undary \n"));
        assert!(decoded.contains("\n\nHere it is\n\n--b0undary\n"));
        assert!(decoded.ends_with("aGk=\n--b0undary--"));
    }

    #[tokio::test]
    async fn test_deliver_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q3-report.txt");
        tokio::fs::write(&path, b"quarterly numbers").await.unwrap();

        let mailer = mailer();
        mailer.deliver_file(&path).await.unwrap();

        let messages = mailer.sender().sent.lock().await;
        let parsed = ParsedMessage::from_encoded(&messages[0]).unwrap();
        let file = parsed.attachments().next().unwrap();
        assert_eq!(file.file_name().as_deref(), Some("q3-report.txt"));
        assert_eq!(file.content_type().unwrap().essence(), "text/plain");
        assert_eq!(file.decode_body().unwrap(), b"quarterly numbers");
    }

    #[tokio::test]
    async fn test_deliver_missing_file() {
        let mailer = mailer();
        let err = mailer
            .deliver_file("/nonexistent/dropmail/upload.bin")
            .await
            .unwrap_err();

        assert!(err.is_attachment_read());
        assert!(mailer.sender().sent.lock().await.is_empty());

        // The mailer stays usable after a failed read.
        mailer.deliver("ok.bin", vec![1]).await.unwrap();
    }

    #[tokio::test]
    async fn test_notify() {
        let mailer = mailer();
        mailer.notify("Server started").await.unwrap();

        let messages = mailer.sender().sent.lock().await;
        assert_eq!(messages[0].alphabet(), Base64Alphabet::Standard);
        assert_eq!(
            messages[0].decode().unwrap(),
            b"From: uploads@x.com\r\nTo: owner@x.com\r\nSubject: New upload\r\n\r\nServer started"
        );
    }

    #[tokio::test]
    async fn test_sender_error_propagates() {
        let mailer = UploadMailer::new(config(), MemorySender::rejecting()).unwrap();
        let err = mailer.deliver("a.txt", b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_rejects_bad_file_name() {
        let mailer = mailer();
        let err = mailer
            .deliver("evil\r\nBcc: c@x.com", b"x".to_vec())
            .await
            .unwrap_err();
        assert!(err.is_input_error());
        assert!(mailer.sender().sent.lock().await.is_empty());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = UploadMailer::new(
            MailerConfig::new("a@x.com", "b@x.com", "Bad\nSubject"),
            MemorySender::default(),
        )
        .unwrap_err();
        assert!(err.is_input_error());
    }
}
