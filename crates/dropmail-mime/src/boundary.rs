//! Random tokens for multipart boundaries.
//!
//! Boundaries are drawn from the operating system's CSPRNG so that two runs
//! never produce the same delimiter sequence.

use crate::error::{Error, Result};
use rand::Rng;
use rand::distributions::Uniform;
use rand::rngs::OsRng;
use std::fmt;
use std::str::FromStr;

/// Length of generated multipart boundaries.
pub const BOUNDARY_LENGTH: usize = 32;

/// Character set a random token is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundaryAlphabet {
    /// Digits and ASCII letters (62 characters).
    #[default]
    Alphanumeric,
    /// ASCII letters only (52 characters).
    Alphabetic,
    /// Decimal digits only (10 characters).
    Numeric,
}

impl BoundaryAlphabet {
    /// Returns the characters of this alphabet.
    #[must_use]
    pub const fn charset(self) -> &'static [u8] {
        match self {
            Self::Alphanumeric => b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
            Self::Alphabetic => b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
            Self::Numeric => b"0123456789",
        }
    }

    /// Returns the short name used in configuration (`alphanum`, `alpha`, `number`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alphanumeric => "alphanum",
            Self::Alphabetic => "alpha",
            Self::Numeric => "number",
        }
    }

    /// Checks whether a character belongs to this alphabet.
    #[must_use]
    pub const fn contains(self, c: char) -> bool {
        match self {
            Self::Alphanumeric => c.is_ascii_alphanumeric(),
            Self::Alphabetic => c.is_ascii_alphabetic(),
            Self::Numeric => c.is_ascii_digit(),
        }
    }
}

impl FromStr for BoundaryAlphabet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "alphanum" => Ok(Self::Alphanumeric),
            "alpha" => Ok(Self::Alphabetic),
            "number" => Ok(Self::Numeric),
            other => Err(Error::UnknownAlphabet(other.to_string())),
        }
    }
}

impl fmt::Display for BoundaryAlphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generates a random token of `length` characters from `alphabet`.
///
/// Every character is sampled uniformly from the alphabet.
///
/// # Errors
///
/// Returns [`Error::InvalidTokenLength`] if `length` is zero.
///
/// # Panics
///
/// Panics if the operating system entropy source fails.
pub fn generate_token(length: usize, alphabet: BoundaryAlphabet) -> Result<String> {
    if length == 0 {
        return Err(Error::InvalidTokenLength);
    }

    Ok(sample(length, alphabet))
}

/// Generates a fresh 32-character alphanumeric multipart boundary.
#[must_use]
pub fn generate_boundary() -> String {
    sample(BOUNDARY_LENGTH, BoundaryAlphabet::Alphanumeric)
}

fn sample(length: usize, alphabet: BoundaryAlphabet) -> String {
    let charset = alphabet.charset();
    let index = Uniform::from(0..charset.len());

    OsRng
        .sample_iter(index)
        .take(length)
        .map(|i| char::from(charset[i]))
        .collect()
}

/// Checks that a caller-supplied boundary can delimit an encoded message.
///
/// Accepts 1 to 70 ASCII alphanumeric characters.
///
/// # Errors
///
/// Returns [`Error::InvalidBoundary`] describing the problem.
pub fn validate_boundary(boundary: &str) -> Result<()> {
    if boundary.is_empty() {
        return Err(Error::InvalidBoundary("boundary is empty".to_string()));
    }
    if boundary.len() > 70 {
        return Err(Error::InvalidBoundary(format!(
            "boundary is {} characters, limit is 70",
            boundary.len()
        )));
    }
    if let Some(c) = boundary.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidBoundary(format!("boundary contains {c:?}")));
    }
    Ok(())
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
    use std::collections::HashSet;

    #[test]
    fn test_charset_sizes() {
        assert_eq!(BoundaryAlphabet::Alphanumeric.charset().len(), 62);
        assert_eq!(BoundaryAlphabet::Alphabetic.charset().len(), 52);
        assert_eq!(BoundaryAlphabet::Numeric.charset().len(), 10);
    }

    #[test]
    fn test_parse_alphabet() {
        assert_eq!(
            "alphanum".parse::<BoundaryAlphabet>().unwrap(),
            BoundaryAlphabet::Alphanumeric
        );
        assert_eq!(
            "alpha".parse::<BoundaryAlphabet>().unwrap(),
            BoundaryAlphabet::Alphabetic
        );
        assert_eq!(
            "number".parse::<BoundaryAlphabet>().unwrap(),
            BoundaryAlphabet::Numeric
        );
    }

    #[test]
    fn test_parse_unknown_alphabet() {
        let err = "hex".parse::<BoundaryAlphabet>().unwrap_err();
        assert!(matches!(err, Error::UnknownAlphabet(ref kind) if kind == "hex"));

        // Names are exact, not case-folded.
        assert!("ALPHANUM".parse::<BoundaryAlphabet>().is_err());
        assert!("".parse::<BoundaryAlphabet>().is_err());
    }

    #[test]
    fn test_alphabet_display_roundtrip() {
        for alphabet in [
            BoundaryAlphabet::Alphanumeric,
            BoundaryAlphabet::Alphabetic,
            BoundaryAlphabet::Numeric,
        ] {
            assert_eq!(alphabet.to_string().parse::<BoundaryAlphabet>().unwrap(), alphabet);
        }
    }

    #[test]
    fn test_generate_token_length_and_charset() {
        for alphabet in [
            BoundaryAlphabet::Alphanumeric,
            BoundaryAlphabet::Alphabetic,
            BoundaryAlphabet::Numeric,
        ] {
            let token = generate_token(32, alphabet).unwrap();
            assert_eq!(token.chars().count(), 32);
            assert!(token.chars().all(|c| alphabet.contains(c)), "{token}");
        }
    }

    #[test]
    fn test_generate_token_zero_length() {
        assert!(matches!(
            generate_token(0, BoundaryAlphabet::Alphanumeric),
            Err(Error::InvalidTokenLength)
        ));
    }

    #[test]
    fn test_boundary_shape() {
        let boundary = generate_boundary();
        assert_eq!(boundary.len(), BOUNDARY_LENGTH);
        assert!(boundary.chars().all(|c| c.is_ascii_alphanumeric()));
        validate_boundary(&boundary).unwrap();
    }

    #[test]
    fn test_boundaries_unique() {
        let boundaries: HashSet<String> = (0..1000).map(|_| generate_boundary()).collect();
        assert_eq!(boundaries.len(), 1000);
    }

    #[test]
    fn test_numeric_tokens_cover_alphabet() {
        let seen: HashSet<char> = generate_token(2000, BoundaryAlphabet::Numeric)
            .unwrap()
            .chars()
            .collect();
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_validate_boundary() {
        validate_boundary("abc123").unwrap();
        assert!(validate_boundary("").is_err());
        assert!(validate_boundary("has space").is_err());
        assert!(validate_boundary("line\nbreak").is_err());
        assert!(validate_boundary(&"a".repeat(71)).is_err());
        validate_boundary(&"a".repeat(70)).unwrap();
    }
}
