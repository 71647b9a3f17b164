//! MIME header handling.

use crate::error::{Error, Result};
use std::fmt;

/// Checks that a header value cannot break out of its header line.
///
/// Rejects CR, LF and every other control character except horizontal tab.
///
/// # Errors
///
/// Returns [`Error::InvalidHeaderValue`] naming the first offending character.
pub fn validate_header_value(field: &'static str, value: &str) -> Result<()> {
    match value
        .char_indices()
        .find(|(_, c)| c.is_control() && *c != '\t')
    {
        Some((position, found)) => Err(Error::InvalidHeaderValue {
            field,
            found,
            position,
        }),
        None => Ok(()),
    }
}

/// Ordered collection of email headers.
///
/// Lookups are case-insensitive; iteration and display keep the original
/// order and spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns header names in order of appearance.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Returns an iterator over all headers in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a header block.
    ///
    /// Lines may end with `\n` or `\r\n`; parsing stops at the first empty
    /// line. Folded continuation lines are joined with a single space and
    /// values are trimmed.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }

            if let Some((name, value)) = line.split_once(':') {
                current = Some((name.trim().to_string(), value.trim().to_string()));
            }
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }

        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
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

    #[test]
    fn test_validate_plain_values() {
        validate_header_value("subject", "Hello, World!").unwrap();
        validate_header_value("subject", "Grüße aus Köln").unwrap();
        validate_header_value("subject", "tab\tseparated").unwrap();
        validate_header_value("subject", "").unwrap();
    }

    #[test]
    fn test_validate_rejects_line_breaks() {
        let err = validate_header_value("subject", "Hi\r\nBcc: evil@example.com").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidHeaderValue {
                field: "subject",
                found: '\r',
                position: 2
            }
        ));

        assert!(validate_header_value("to", "a@x.com\nb@x.com").is_err());
        assert!(validate_header_value("from", "nul\0byte").is_err());
        assert!(validate_header_value("from", "del\x7f").is_err());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
        assert_eq!(headers.get("Subject"), None);
    }

    #[test]
    fn test_headers_keep_order() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("From", "bob@example.com");
        headers.add("To", "carol@example.com");

        assert_eq!(headers.names().collect::<Vec<_>>(), ["To", "From", "To"]);
        assert_eq!(
            headers.get_all("to"),
            ["alice@example.com", "carol@example.com"]
        );
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_headers_parse_crlf() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "Body: not a header\r\n"
        );

        let headers = Headers::parse(text);
        assert_eq!(headers.len(), 4);
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(headers.get("Body"), None);
    }

    #[test]
    fn test_headers_parse_lf() {
        let text = "Content-Type: multipart/mixed; boundary=abc \nMIME-Version: 1.0\nto: b@x.com\n\n";
        let headers = Headers::parse(text);
        assert_eq!(
            headers.names().collect::<Vec<_>>(),
            ["Content-Type", "MIME-Version", "to"]
        );
        assert_eq!(
            headers.get("content-type"),
            Some("multipart/mixed; boundary=abc")
        );
    }

    #[test]
    fn test_headers_display() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com");
        headers.add("To", "recipient@example.com");

        assert_eq!(
            headers.to_string(),
            "From: sender@example.com\r\nTo: recipient@example.com\r\n"
        );
    }
}
