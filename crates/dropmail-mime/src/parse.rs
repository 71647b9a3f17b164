//! Parsing of encoded messages back into headers and parts.
//!
//! Covers what the encoders emit: single-part messages and one level of
//! `multipart/*` with `7bit`, `8bit`, `binary` or `base64` parts. Lines may
//! end with `\n` or `\r\n`.

use crate::content_type::{ContentType, parse_parameters};
use crate::encoding::decode_base64;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::EncodedMessage;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// One part of a multipart message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body as transmitted, without the line break that precedes the
    /// next delimiter.
    pub body: String,
}

impl Part {
    /// Gets the content type, defaulting to `text/plain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::new("text", "plain")), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns true if the part is marked as an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.headers.get("content-disposition").is_some_and(|d| {
            d.split(';')
                .next()
                .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("attachment"))
        })
    }

    /// Returns the file name from `Content-Disposition`, falling back to the
    /// content type `name` parameter.
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        let from_disposition = self.headers.get("content-disposition").and_then(|d| {
            parse_parameters(d.split(';').skip(1))
                .into_iter()
                .find(|(key, _)| key == "filename")
                .map(|(_, value)| value)
        });

        from_disposition.or_else(|| {
            self.content_type()
                .ok()
                .and_then(|ct| ct.name().map(str::to_string))
        })
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if a base64 body is malformed.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => {
                // Remove line breaks for lenient parsing
                let cleaned: String = self.body.chars().filter(|c| !c.is_whitespace()).collect();
                decode_base64(&cleaned)
            }
            _ => Ok(self.body.clone().into_bytes()),
        }
    }
}

/// A decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Message headers.
    pub headers: Headers,
    /// Message parts (empty for single-part messages).
    pub parts: Vec<Part>,
    /// Body for single-part messages.
    pub body: Option<String>,
    /// Text after the closing delimiter.
    pub epilogue: String,
}

impl ParsedMessage {
    /// Decodes and parses an encoded message.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not decode or parse.
    pub fn from_encoded(message: &EncodedMessage) -> Result<Self> {
        Self::parse(&message.decode()?)
    }

    /// Parses raw message bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is not UTF-8, or if a multipart
    /// message lacks a boundary or its closing delimiter.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let text = String::from_utf8(raw.to_vec())?;
        let (head, body) = split_head(&text);
        let headers = Headers::parse(head);

        let content_type = headers
            .get("content-type")
            .map(ContentType::parse)
            .transpose()?;

        match content_type {
            Some(ct) if ct.is_multipart() => {
                let boundary = ct.boundary().ok_or(Error::MissingBoundary)?;
                let (parts, epilogue) = split_parts(body, boundary)?;
                Ok(Self {
                    headers,
                    parts,
                    body: None,
                    epilogue,
                })
            }
            _ => Ok(Self {
                headers,
                parts: Vec::new(),
                body: Some(body.to_string()),
                epilogue: String::new(),
            }),
        }
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.get("to")
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Finds the first inline text part.
    #[must_use]
    pub fn text_part(&self) -> Option<&Part> {
        self.parts.iter().find(|part| {
            !part.is_attachment() && part.content_type().is_ok_and(|ct| ct.is_text())
        })
    }

    /// Returns the parts marked as attachments.
    pub fn attachments(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter().filter(|part| part.is_attachment())
    }
}

/// Splits a message or part at the first empty line.
fn split_head(text: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line == "\n" || line == "\r\n" {
            return (&text[..offset], &text[offset + line.len()..]);
        }
        offset += line.len();
    }
    (text, "")
}

fn split_parts(body: &str, boundary: &str) -> Result<(Vec<Part>, String)> {
    let open = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut current: Option<String> = None;
    let mut lines = body.split_inclusive('\n');

    for line in lines.by_ref() {
        let delimiter = line.trim_end();
        if delimiter == close {
            if let Some(text) = current.take() {
                parts.push(finish_part(&text));
            }
            let epilogue: String = lines.collect();
            return Ok((parts, epilogue));
        }
        if delimiter == open {
            if let Some(text) = current.take() {
                parts.push(finish_part(&text));
            }
            current = Some(String::new());
            continue;
        }
        if let Some(text) = current.as_mut() {
            text.push_str(line);
        }
    }

    Err(Error::InvalidMultipart(format!(
        "missing closing delimiter {close}"
    )))
}

fn finish_part(text: &str) -> Part {
    let (head, body) = split_head(text);
    // The line break before a delimiter belongs to the delimiter.
    let body = body
        .strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body);

    Part {
        headers: Headers::parse(head),
        body: body.to_string(),
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
    use crate::compose::{AttachmentEncoder, encode_plain, encode_with_attachment};
    use crate::message::{Attachment, EmailEnvelope};
    use proptest::prelude::*;

    fn envelope() -> EmailEnvelope {
        EmailEnvelope::new("a@x.com", "b@x.com", "Hi")
    }

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse(" Base64 "), TransferEncoding::Base64);
        assert_eq!(TransferEncoding::parse("8bit"), TransferEncoding::EightBit);
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn test_parse_plain_message() {
        let message = encode_plain(&envelope(), "Trial!").unwrap();
        let parsed = ParsedMessage::from_encoded(&message).unwrap();

        assert_eq!(parsed.from(), Some("a@x.com"));
        assert_eq!(parsed.to(), Some("b@x.com"));
        assert_eq!(parsed.subject(), Some("Hi"));
        assert_eq!(parsed.body.as_deref(), Some("Trial!"));
        assert!(parsed.parts.is_empty());
    }

    #[test]
    fn test_parse_attachment_message() {
        let attachment = Attachment::new("report.pdf", b"%PDF-1.4\n%binary\x00".to_vec());
        let message = encode_with_attachment(&envelope(), "See attached.", &attachment).unwrap();
        let parsed = ParsedMessage::from_encoded(&message).unwrap();

        assert_eq!(
            parsed.headers.names().collect::<Vec<_>>(),
            ["Content-Type", "MIME-Version", "to", "from", "subject"]
        );
        assert_eq!(parsed.parts.len(), 2);
        assert!(parsed.epilogue.is_empty());

        let text = &parsed.parts[0];
        assert_eq!(text.content_type().unwrap().essence(), "text/plain");
        assert_eq!(text.transfer_encoding(), TransferEncoding::SevenBit);
        assert_eq!(text.body, "See attached.\n");
        assert_eq!(parsed.text_part(), Some(text));

        let file = &parsed.parts[1];
        assert!(file.is_attachment());
        assert_eq!(file.file_name().as_deref(), Some("report.pdf"));
        assert_eq!(file.content_type().unwrap().essence(), "application/pdf");
        assert_eq!(file.decode_body().unwrap(), attachment.raw_bytes());
        assert_eq!(parsed.attachments().count(), 1);
    }

    #[test]
    fn test_round_trip_non_ascii_name() {
        let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x01\x00".to_vec();
        let attachment = Attachment::new("Übersicht 写真.png", png.clone());
        let message = encode_with_attachment(&envelope(), "Grüße", &attachment).unwrap();
        let parsed = ParsedMessage::from_encoded(&message).unwrap();

        let file = parsed.attachments().next().unwrap();
        assert_eq!(file.file_name().as_deref(), Some("Übersicht 写真.png"));
        assert_eq!(file.content_type().unwrap().essence(), "image/png");
        assert_eq!(file.decode_body().unwrap(), png);
    }

    #[test]
    fn test_parse_crlf_multipart() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=\"xyz\"\r\n",
            "\r\n",
            "preamble\r\n",
            "--xyz\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "hello\r\n",
            "--xyz--\r\n",
            "epilogue\r\n"
        );
        let parsed = ParsedMessage::parse(raw.as_bytes()).unwrap();
        assert_eq!(parsed.parts.len(), 1);
        assert_eq!(parsed.parts[0].body, "hello");
        assert_eq!(parsed.epilogue, "epilogue\r\n");
    }

    #[test]
    fn test_parse_missing_boundary() {
        let raw = b"Content-Type: multipart/mixed\n\n--x\n\n--x--";
        assert!(matches!(
            ParsedMessage::parse(raw),
            Err(Error::MissingBoundary)
        ));
    }

    #[test]
    fn test_parse_unterminated_multipart() {
        let raw = b"Content-Type: multipart/mixed; boundary=x\n\n--x\n\nbody\n";
        assert!(matches!(
            ParsedMessage::parse(raw),
            Err(Error::InvalidMultipart(_))
        ));
    }

    #[test]
    fn test_part_name_fallback() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "image/gif; name=\"anim.gif\"");
        let part = Part {
            headers,
            body: String::new(),
        };
        assert!(!part.is_attachment());
        assert_eq!(part.file_name().as_deref(), Some("anim.gif"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_attachment_round_trip(
            bytes in proptest::collection::vec(any::<u8>(), 0..2048),
            name in "[\\p{L}\\p{N} ._-]{0,24}",
            content in "[^\r\n]{0,80}",
        ) {
            let attachment = Attachment::new(name.clone(), bytes.clone());
            let message = AttachmentEncoder::new()
                .encode(&envelope(), &content, &attachment)
                .unwrap();
            let parsed = ParsedMessage::from_encoded(&message).unwrap();

            prop_assert_eq!(parsed.parts.len(), 2);
            prop_assert!(parsed.epilogue.is_empty());
            prop_assert_eq!(parsed.parts[0].body.clone(), format!("{content}\n"));

            let file = &parsed.parts[1];
            prop_assert_eq!(file.file_name(), Some(name));
            let sniffed = ContentType::parse(attachment.detected_mime_type()).unwrap();
            prop_assert_eq!(file.content_type().unwrap().essence(), sniffed.essence());
            prop_assert_eq!(file.decode_body().unwrap(), bytes);
        }

        #[test]
        fn prop_plain_round_trip(content in "\\PC{0,200}", subject in "[ -~]{1,40}") {
            prop_assume!(!subject.trim().is_empty());
            let envelope = EmailEnvelope::new("a@x.com", "b@x.com", subject.clone());
            let message = encode_plain(&envelope, &content).unwrap();
            let expected =
                format!("From: a@x.com\r\nTo: b@x.com\r\nSubject: {subject}\r\n\r\n{content}");
            prop_assert_eq!(message.decode().unwrap(), expected.into_bytes());
        }
    }
}
