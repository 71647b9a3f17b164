//! Base64 transfer encoding and line wrapping.
//!
//! Two alphabets are in play: attachment bodies and plain messages use the
//! standard alphabet, while multipart messages are wrapped for transport with
//! the URL-safe one.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};

/// Maximum line length for base64 bodies (RFC 2045).
pub const MAX_LINE_LENGTH: usize = 76;

/// Line terminator used inside attachment bodies.
pub const BODY_LINE_END: &str = "\n";

/// Base64 alphabet of an encoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base64Alphabet {
    /// RFC 4648 section 4 (`+` and `/`).
    Standard,
    /// RFC 4648 section 5 (`-` and `_`).
    UrlSafe,
}

impl Base64Alphabet {
    /// Encodes bytes with this alphabet (padded).
    #[must_use]
    pub fn encode(self, data: &[u8]) -> String {
        match self {
            Self::Standard => STANDARD.encode(data),
            Self::UrlSafe => URL_SAFE.encode(data),
        }
    }

    /// Decodes a padded string in this alphabet.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid for this alphabet.
    pub fn decode(self, data: &str) -> Result<Vec<u8>> {
        match self {
            Self::Standard => STANDARD.decode(data),
            Self::UrlSafe => URL_SAFE.decode(data),
        }
        .map_err(Into::into)
    }
}

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    Base64Alphabet::Standard.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    Base64Alphabet::Standard.decode(data)
}

/// Encodes data as URL-safe Base64.
#[must_use]
pub fn encode_base64_url(data: &[u8]) -> String {
    Base64Alphabet::UrlSafe.encode(data)
}

/// Decodes URL-safe Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid URL-safe Base64.
pub fn decode_base64_url(data: &str) -> Result<Vec<u8>> {
    Base64Alphabet::UrlSafe.decode(data)
}

/// Splits `body` into lines of `limit` characters, appending `line_end`
/// after each one.
///
/// The last line may be shorter and is terminated as well. An empty body
/// yields an empty string.
///
/// # Errors
///
/// Returns [`Error::InvalidChunkLimit`] if `limit` is zero.
pub fn chunk_lines(body: &str, limit: usize, line_end: &str) -> Result<String> {
    if limit == 0 {
        return Err(Error::InvalidChunkLimit);
    }

    let lines = body.chars().count().div_ceil(limit);
    let mut result = String::with_capacity(body.len() + lines * line_end.len());
    let mut width = 0;

    for ch in body.chars() {
        result.push(ch);
        width += 1;
        if width == limit {
            result.push_str(line_end);
            width = 0;
        }
    }

    if width > 0 {
        result.push_str(line_end);
    }

    Ok(result)
}

/// Encodes data as standard Base64 wrapped at 76 characters per line.
#[must_use]
pub fn wrap_base64(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH + 1);

    // Base64 output is ASCII, so byte chunks are character chunks.
    for line in encoded.as_bytes().chunks(MAX_LINE_LENGTH) {
        result.extend(line.iter().copied().map(char::from));
        result.push_str(BODY_LINE_END);
    }

    result
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
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_url_safe_alphabet() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet.
        let data = [0xfb, 0xff];
        assert_eq!(encode_base64(&data), "+/8=");
        assert_eq!(encode_base64_url(&data), "-_8=");
        assert_eq!(decode_base64_url("-_8=").unwrap(), data);
        assert!(decode_base64_url("+/8=").is_err());
        assert!(decode_base64("-_8=").is_err());
    }

    #[test]
    fn test_chunk_empty_body() {
        assert_eq!(chunk_lines("", 76, "\n").unwrap(), "");
    }

    #[test]
    fn test_chunk_short_body() {
        assert_eq!(chunk_lines("abc", 76, "\n").unwrap(), "abc\n");
        assert_eq!(chunk_lines("abc", 3, "\r\n").unwrap(), "abc\r\n");
    }

    #[test]
    fn test_chunk_exact_multiple() {
        assert_eq!(chunk_lines("abcdef", 3, "|").unwrap(), "abc|def|");
    }

    #[test]
    fn test_chunk_remainder() {
        assert_eq!(chunk_lines("abcdefg", 3, "\n").unwrap(), "abc\ndef\ng\n");
    }

    #[test]
    fn test_chunk_zero_limit() {
        assert!(matches!(
            chunk_lines("abc", 0, "\n"),
            Err(Error::InvalidChunkLimit)
        ));
    }

    #[test]
    fn test_chunk_counts_characters() {
        assert_eq!(chunk_lines("héllo", 2, "\n").unwrap(), "hé\nll\no\n");
    }

    #[test]
    fn test_chunk_200_characters() {
        let body = "A".repeat(200);
        let chunked = chunk_lines(&body, MAX_LINE_LENGTH, "\n").unwrap();
        let widths: Vec<usize> = chunked.split_terminator('\n').map(str::len).collect();
        assert_eq!(widths, [76, 76, 48]);
        assert!(chunked.ends_with('\n'));
    }

    #[test]
    fn test_wrap_base64_150_bytes() {
        // 150 bytes encode to exactly 200 characters.
        let data = vec![0xAB; 150];
        assert_eq!(encode_base64(&data).len(), 200);
        let wrapped = wrap_base64(&data);
        let lines: Vec<&str> = wrapped.split_terminator('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 76);
        assert_eq!(lines[1].len(), 76);
        assert_eq!(lines[2].len(), 48);
        assert!(wrapped.ends_with('\n'));
    }

    #[test]
    fn test_wrap_base64_matches_chunk_lines() {
        let data: Vec<u8> = (0..=255).collect();
        let expected = chunk_lines(&encode_base64(&data), MAX_LINE_LENGTH, "\n").unwrap();
        assert_eq!(wrap_base64(&data), expected);
        assert_eq!(wrap_base64(&[]), "");
    }

    proptest! {
        #[test]
        fn prop_chunk_rejoins(body in "[A-Za-z0-9+/=]{0,400}", limit in 1usize..100) {
            let chunked = chunk_lines(&body, limit, "\n").unwrap();
            prop_assert_eq!(chunked.replace('\n', ""), body.clone());
            if !body.is_empty() {
                prop_assert!(chunked.ends_with('\n'));
            }
        }

        #[test]
        fn prop_chunk_line_widths(body in "\\PC{0,200}", limit in 1usize..40) {
            let chunked = chunk_lines(&body, limit, "\r\n").unwrap();
            let lines: Vec<&str> = chunked.split_terminator("\r\n").collect();
            prop_assert_eq!(lines.len(), body.chars().count().div_ceil(limit));
            if let Some((last, full)) = lines.split_last() {
                prop_assert!(full.iter().all(|line| line.chars().count() == limit));
                prop_assert!(last.chars().count() <= limit);
            }
        }
    }
}
