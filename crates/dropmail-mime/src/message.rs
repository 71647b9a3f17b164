//! Message inputs and the encoded output.

use crate::encoding::Base64Alphabet;
use crate::error::{Error, Result};
use crate::header::validate_header_value;
use crate::sniff::detect_content_type;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Sender, recipient and subject of a message.
///
/// Addresses are passed through as given; only emptiness and control
/// characters are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailEnvelope {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
}

impl EmailEnvelope {
    /// Creates a new envelope.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
        }
    }

    /// Checks that every field is present and safe to place in a header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyField`] or [`Error::InvalidHeaderValue`].
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("from", &self.from),
            ("to", &self.to),
            ("subject", &self.subject),
        ] {
            if value.trim().is_empty() {
                return Err(Error::EmptyField(field));
            }
            validate_header_value(field, value)?;
        }
        Ok(())
    }
}

/// A file attached to a message.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    raw_bytes: Vec<u8>,
    file_name: String,
    detected_mime_type: &'static str,
}

impl Attachment {
    /// Creates an attachment from bytes, sniffing its content type.
    #[must_use]
    pub fn new(file_name: impl Into<String>, raw_bytes: Vec<u8>) -> Self {
        let detected_mime_type = detect_content_type(&raw_bytes);
        Self {
            raw_bytes,
            file_name: file_name.into(),
            detected_mime_type,
        }
    }

    /// Reads an attachment to the end of `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttachmentRead`] if reading fails.
    pub fn from_reader(file_name: impl Into<String>, mut reader: impl Read) -> Result<Self> {
        let file_name = file_name.into();
        let mut raw_bytes = Vec::new();
        match reader.read_to_end(&mut raw_bytes) {
            Ok(_) => Ok(Self::new(file_name, raw_bytes)),
            Err(e) => Err(Error::attachment_read(file_name, e)),
        }
    }

    /// Reads an attachment from disk, named after the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttachmentRead`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match std::fs::read(path) {
            Ok(raw_bytes) => Ok(Self::new(file_name, raw_bytes)),
            Err(e) => Err(Error::attachment_read(path.display().to_string(), e)),
        }
    }

    /// Returns the attachment bytes.
    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    /// Returns the file name used for `name=` and `filename=`.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the sniffed content type.
    #[must_use]
    pub const fn detected_mime_type(&self) -> &'static str {
        self.detected_mime_type
    }

    /// Returns the attachment size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw_bytes.len()
    }

    /// Returns true if the attachment has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw_bytes.is_empty()
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("detected_mime_type", &self.detected_mime_type)
            .field("len", &self.raw_bytes.len())
            .finish()
    }
}

/// A complete message, base64 encoded for a mail API `raw` field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EncodedMessage {
    /// Encoded message.
    pub raw: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    alphabet: Base64Alphabet,
}

impl EncodedMessage {
    pub(crate) fn encode(message: &[u8], alphabet: Base64Alphabet) -> Self {
        Self {
            raw: alphabet.encode(message),
            alphabet,
        }
    }

    /// Returns the alphabet `raw` is encoded with.
    #[must_use]
    pub const fn alphabet(&self) -> Base64Alphabet {
        self.alphabet
    }

    /// Decodes `raw` back into the message bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not valid for its alphabet.
    pub fn decode(&self) -> Result<Vec<u8>> {
        self.alphabet.decode(&self.raw)
    }

    /// Consumes the message, returning the encoded payload.
    #[must_use]
    pub fn into_raw(self) -> String {
        self.raw
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
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated upload"))
        }
    }

    #[test]
    fn test_envelope_validate() {
        EmailEnvelope::new("a@x.com", "b@x.com", "Hi").validate().unwrap();
    }

    #[test]
    fn test_envelope_empty_fields() {
        let err = EmailEnvelope::new("", "b@x.com", "Hi").validate().unwrap_err();
        assert!(matches!(err, Error::EmptyField("from")));
        assert!(err.is_input_error());

        let err = EmailEnvelope::new("a@x.com", "  ", "Hi").validate().unwrap_err();
        assert!(matches!(err, Error::EmptyField("to")));

        let err = EmailEnvelope::new("a@x.com", "b@x.com", "").validate().unwrap_err();
        assert!(matches!(err, Error::EmptyField("subject")));
    }

    #[test]
    fn test_envelope_header_injection() {
        let envelope = EmailEnvelope::new("a@x.com", "b@x.com", "Hi\r\nBcc: c@x.com");
        assert!(matches!(
            envelope.validate(),
            Err(Error::InvalidHeaderValue { field: "subject", .. })
        ));
    }

    #[test]
    fn test_attachment_sniffs_type() {
        let png = Attachment::new("pic.png", b"\x89PNG\r\n\x1a\n\x00\x00".to_vec());
        assert_eq!(png.detected_mime_type(), "image/png");
        assert_eq!(png.file_name(), "pic.png");
        assert_eq!(png.len(), 10);

        // The name does not influence the type.
        let text = Attachment::new("pic.png", b"just text".to_vec());
        assert_eq!(text.detected_mime_type(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_attachment_from_reader() {
        let attachment = Attachment::from_reader("notes.txt", &b"hello"[..]).unwrap();
        assert_eq!(attachment.raw_bytes(), b"hello");
    }

    #[test]
    fn test_attachment_read_error() {
        let err = Attachment::from_reader("upload.bin", FailingReader).unwrap_err();
        match err {
            Error::AttachmentRead { name, source } => {
                assert_eq!(name, "upload.bin");
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_attachment_missing_file() {
        let err = Attachment::from_file("/nonexistent/dropmail/upload.png").unwrap_err();
        assert!(matches!(err, Error::AttachmentRead { .. }));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_attachment_debug_omits_bytes() {
        let attachment = Attachment::new("a.bin", vec![0; 4096]);
        let debug = format!("{attachment:?}");
        assert!(debug.contains("len: 4096"));
        assert!(debug.len() < 200);
    }

    #[test]
    fn test_encoded_message_decode() {
        let message = EncodedMessage::encode(b"\xfb\xff", Base64Alphabet::UrlSafe);
        assert_eq!(message.raw, "-_8=");
        assert_eq!(message.alphabet(), Base64Alphabet::UrlSafe);
        assert_eq!(message.decode().unwrap(), b"\xfb\xff");
        assert_eq!(message.into_raw(), "-_8=");
    }
}
