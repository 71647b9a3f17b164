//! Message encoders.
//!
//! Both encoders produce a complete RFC 5322 message and wrap it in base64
//! for a mail API `raw` field. The exact bytes, header order and part order
//! are part of the contract with the receiving API.

use crate::boundary::{generate_boundary, validate_boundary};
use crate::encoding::{Base64Alphabet, wrap_base64};
use crate::error::Result;
use crate::header::validate_header_value;
use crate::message::{Attachment, EmailEnvelope, EncodedMessage};
use std::fmt::Write as _;

/// Encodes a single-part text message with the standard base64 alphabet.
///
/// The message is `From`, `To` and `Subject` (CRLF terminated), a blank line,
/// then `content` verbatim.
///
/// # Errors
///
/// Returns an error if the envelope is incomplete or a header value contains
/// control characters.
pub fn encode_plain(envelope: &EmailEnvelope, content: &str) -> Result<EncodedMessage> {
    envelope.validate()?;

    let message = format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n{content}",
        envelope.from, envelope.to, envelope.subject
    );

    Ok(EncodedMessage::encode(
        message.as_bytes(),
        Base64Alphabet::Standard,
    ))
}

/// Encodes a `multipart/mixed` message with a text part and one attachment,
/// using a fresh random boundary.
///
/// # Errors
///
/// See [`AttachmentEncoder::encode`].
pub fn encode_with_attachment(
    envelope: &EmailEnvelope,
    content: &str,
    attachment: &Attachment,
) -> Result<EncodedMessage> {
    AttachmentEncoder::new().encode(envelope, content, attachment)
}

/// Builds `multipart/mixed` messages carrying one attachment.
///
/// The output is encoded with the URL-safe base64 alphabet.
#[derive(Debug, Clone, Default)]
pub struct AttachmentEncoder {
    boundary: Option<String>,
}

impl AttachmentEncoder {
    /// Creates an encoder that generates a new boundary per message.
    #[must_use]
    pub const fn new() -> Self {
        Self { boundary: None }
    }

    /// Uses a fixed boundary instead of a random one.
    ///
    /// # Errors
    ///
    /// Returns an error unless the boundary is 1 to 70 ASCII alphanumerics.
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Result<Self> {
        let boundary = boundary.into();
        validate_boundary(&boundary)?;
        self.boundary = Some(boundary);
        Ok(self)
    }

    /// Encodes the message.
    ///
    /// Part order is text first, attachment second, followed by the closing
    /// delimiter with nothing after it.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope is incomplete or a header value
    /// (including the file name) contains control characters.
    pub fn encode(
        &self,
        envelope: &EmailEnvelope,
        content: &str,
        attachment: &Attachment,
    ) -> Result<EncodedMessage> {
        envelope.validate()?;
        validate_header_value("file_name", attachment.file_name())?;

        let boundary = self.boundary.clone().unwrap_or_else(generate_boundary);
        let message = assemble(&boundary, envelope, content, attachment);

        Ok(EncodedMessage::encode(
            message.as_bytes(),
            Base64Alphabet::UrlSafe,
        ))
    }
}

fn assemble(
    boundary: &str,
    envelope: &EmailEnvelope,
    content: &str,
    attachment: &Attachment,
) -> String {
    let body = wrap_base64(attachment.raw_bytes());
    let name = attachment.file_name();
    let mut message = String::with_capacity(body.len() + content.len() + 512);

    // Top-level headers
    let _ = writeln!(
        message,
        "Content-Type: multipart/mixed; boundary={boundary} "
    );
    message.push_str("MIME-Version: 1.0\n");
    let _ = writeln!(message, "to: {}", envelope.to);
    let _ = writeln!(message, "from: {}", envelope.from);
    let _ = writeln!(message, "subject: {}\n", envelope.subject);

    // Text part
    let _ = writeln!(message, "--{boundary}");
    message.push_str("Content-Type: text/plain; charset=\"UTF-8\"\n");
    message.push_str("MIME-Version: 1.0\n");
    message.push_str("Content-Transfer-Encoding: 7bit\n\n");
    message.push_str(content);
    message.push_str("\n\n");

    // Attachment part
    let _ = writeln!(message, "--{boundary}");
    let _ = writeln!(
        message,
        "Content-Type: {}; name=\"{name}\" ",
        attachment.detected_mime_type()
    );
    message.push_str("MIME-Version: 1.0\n");
    message.push_str("Content-Transfer-Encoding: base64\n");
    let _ = writeln!(
        message,
        "Content-Disposition: attachment; filename=\"{name}\" \n"
    );
    message.push_str(&body);

    let _ = write!(message, "--{boundary}--");

    message
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
    use crate::encoding::{decode_base64, decode_base64_url};
    use crate::error::Error;

    fn envelope() -> EmailEnvelope {
        EmailEnvelope::new("a@x.com", "b@x.com", "Hi")
    }

    #[test]
    fn test_plain_scenario() {
        let message = encode_plain(&envelope(), "Trial!").unwrap();
        assert_eq!(message.alphabet(), Base64Alphabet::Standard);

        let decoded = decode_base64(&message.raw).unwrap();
        assert_eq!(
            decoded,
            b"From: a@x.com\r\nTo: b@x.com\r\nSubject: Hi\r\n\r\nTrial!"
        );
    }

    #[test]
    fn test_plain_known_encoding() {
        let message = encode_plain(&envelope(), "Trial!").unwrap();
        assert_eq!(
            message.raw,
            "RnJvbTogYUB4LmNvbQ0KVG86IGJAeC5jb20NClN1YmplY3Q6IEhpDQoNClRyaWFsIQ=="
        );
    }

    #[test]
    fn test_plain_empty_content() {
        let message = encode_plain(&envelope(), "").unwrap();
        assert_eq!(
            message.decode().unwrap(),
            b"From: a@x.com\r\nTo: b@x.com\r\nSubject: Hi\r\n\r\n"
        );
    }

    #[test]
    fn test_plain_rejects_injection() {
        let bad = EmailEnvelope::new("a@x.com", "b@x.com\r\nBcc: c@x.com", "Hi");
        assert!(matches!(
            encode_plain(&bad, "x"),
            Err(Error::InvalidHeaderValue { field: "to", .. })
        ));
    }

    #[test]
    fn test_attachment_exact_bytes() {
        let attachment = Attachment::new("hello.txt", b"Hello, World!".to_vec());
        let message = AttachmentEncoder::new()
            .with_boundary("B0undary")
            .unwrap()
            .encode(&envelope(), "Trial", &attachment)
            .unwrap();

        assert_eq!(message.alphabet(), Base64Alphabet::UrlSafe);
        let decoded = String::from_utf8(decode_base64_url(&message.raw).unwrap()).unwrap();

        let expected = concat!(
            "Content-Type: multipart/mixed; boundary=B0undary \n",
            "MIME-Version: 1.0\n",
            "to: b@x.com\n",
            "from: a@x.com\n",
            "subject: Hi\n",
            "\n",
            "--B0undary\n",
            "Content-Type: text/plain; charset=\"UTF-8\"\n",
            "MIME-Version: 1.0\n",
            "Content-Transfer-Encoding: 7bit\n",
            "\n",
            "Trial\n",
            "\n",
            "--B0undary\n",
            "Content-Type: text/plain; charset=utf-8; name=\"hello.txt\" \n",
            "MIME-Version: 1.0\n",
            "Content-Transfer-Encoding: base64\n",
            "Content-Disposition: attachment; filename=\"hello.txt\" \n",
            "\n",
            "SGVsbG8sIFdvcmxkIQ==\n",
            "--B0undary--"
        );
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_attachment_png_exact_bytes() {
        let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR".to_vec();
        let attachment = Attachment::new("stofication.png", png);
        let message = AttachmentEncoder::new()
            .with_boundary("abc")
            .unwrap()
            .encode(&envelope(), "You just uploaded this file!", &attachment)
            .unwrap();

        let decoded = String::from_utf8(message.decode().unwrap()).unwrap();
        assert!(decoded.contains(
            "--abc\nContent-Type: image/png; name=\"stofication.png\" \nMIME-Version: 1.0\n"
        ));
        assert!(decoded.contains("\n\niVBORw0KGgoAAAANSUhEUg==\n--abc--"));
        assert!(decoded.ends_with("--abc--"));
    }

    #[test]
    fn test_attachment_random_boundary() {
        let attachment = Attachment::new("a.bin", vec![1, 2, 3]);
        let first = encode_with_attachment(&envelope(), "x", &attachment).unwrap();
        let second = encode_with_attachment(&envelope(), "x", &attachment).unwrap();
        assert_ne!(first.raw, second.raw);

        let decoded = String::from_utf8(first.decode().unwrap()).unwrap();
        let header = decoded.lines().next().unwrap();
        let boundary = header
            .strip_prefix("Content-Type: multipart/mixed; boundary=")
            .unwrap()
            .trim_end();
        assert_eq!(boundary.len(), 32);
        assert_eq!(decoded.matches(&format!("--{boundary}\n")).count(), 2);
        assert!(decoded.ends_with(&format!("--{boundary}--")));
    }

    #[test]
    fn test_attachment_wraps_body() {
        let attachment = Attachment::new("blob.bin", vec![0; 150]);
        let message = AttachmentEncoder::new()
            .with_boundary("zz")
            .unwrap()
            .encode(&envelope(), "", &attachment)
            .unwrap();

        let decoded = String::from_utf8(message.decode().unwrap()).unwrap();
        let body = decoded
            .split("filename=\"blob.bin\" \n\n")
            .nth(1)
            .unwrap()
            .strip_suffix("--zz--")
            .unwrap();
        let widths: Vec<usize> = body.split_terminator('\n').map(str::len).collect();
        assert_eq!(widths, [76, 76, 48]);
    }

    #[test]
    fn test_attachment_output_is_url_safe() {
        // Bytes chosen so the standard alphabet would emit '+' and '/'.
        let attachment = Attachment::new("x.bin", vec![0xfb; 300]);
        let message = encode_with_attachment(&envelope(), "body ??>>", &attachment).unwrap();
        assert!(!message.raw.contains('+'));
        assert!(!message.raw.contains('/'));
    }

    #[test]
    fn test_attachment_empty_file() {
        let attachment = Attachment::new("", Vec::new());
        let message = AttachmentEncoder::new()
            .with_boundary("q")
            .unwrap()
            .encode(&envelope(), "x", &attachment)
            .unwrap();
        let decoded = String::from_utf8(message.decode().unwrap()).unwrap();
        assert!(decoded.ends_with("filename=\"\" \n\n--q--"));
    }

    #[test]
    fn test_attachment_rejects_bad_input() {
        let attachment = Attachment::new("a.txt", b"x".to_vec());
        let bad = EmailEnvelope::new("a@x.com", "b@x.com", "");
        assert!(matches!(
            encode_with_attachment(&bad, "x", &attachment),
            Err(Error::EmptyField("subject"))
        ));

        let sneaky = Attachment::new("a.txt\"\r\nX-Evil: 1", b"x".to_vec());
        assert!(matches!(
            encode_with_attachment(&envelope(), "x", &sneaky),
            Err(Error::InvalidHeaderValue {
                field: "file_name",
                ..
            })
        ));
    }

    #[test]
    fn test_with_boundary_validation() {
        assert!(AttachmentEncoder::new().with_boundary("").is_err());
        assert!(AttachmentEncoder::new().with_boundary("a-b").is_err());
    }
}
