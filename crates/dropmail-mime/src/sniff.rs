//! Content type detection from leading bytes.
//!
//! Implements the signature table of the WHATWG MIME Sniffing standard. Only
//! the first [`SNIFF_LEN`] bytes are inspected and the result depends on
//! nothing but those bytes.

/// Number of leading bytes considered when sniffing.
pub const SNIFF_LEN: usize = 512;

/// Fallback for binary data that matches no signature.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Result for data without binary control bytes.
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

const TEXT_HTML: &str = "text/html; charset=utf-8";

enum Signature {
    /// Case-insensitive HTML tag, terminated by a space or `>`.
    Html(&'static [u8]),
    /// `data & mask == pattern` over the pattern length.
    Masked {
        mask: &'static [u8],
        pattern: &'static [u8],
        skip_ws: bool,
        content_type: &'static str,
    },
    /// Literal prefix.
    Exact(&'static [u8], &'static str),
    /// ISO base media file with an `mp4` brand.
    Mp4,
    /// Anything without binary control bytes.
    Text,
}

const EOT_MASK: &[u8] = b"\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\xFF\xFF";
const EOT_PATTERN: &[u8] = b"\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00LP";

const SIGNATURES: &[Signature] = &[
    Signature::Html(b"<!DOCTYPE HTML"),
    Signature::Html(b"<HTML"),
    Signature::Html(b"<HEAD"),
    Signature::Html(b"<SCRIPT"),
    Signature::Html(b"<IFRAME"),
    Signature::Html(b"<H1"),
    Signature::Html(b"<DIV"),
    Signature::Html(b"<FONT"),
    Signature::Html(b"<TABLE"),
    Signature::Html(b"<A"),
    Signature::Html(b"<STYLE"),
    Signature::Html(b"<TITLE"),
    Signature::Html(b"<B"),
    Signature::Html(b"<BODY"),
    Signature::Html(b"<BR"),
    Signature::Html(b"<P"),
    Signature::Html(b"<!--"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF",
        pattern: b"<?xml",
        skip_ws: true,
        content_type: "text/xml; charset=utf-8",
    },
    Signature::Exact(b"%PDF-", "application/pdf"),
    Signature::Exact(b"%!PS-Adobe-", "application/postscript"),
    // Byte order marks
    Signature::Masked {
        mask: b"\xFF\xFF\x00\x00",
        pattern: b"\xFE\xFF\x00\x00",
        skip_ws: false,
        content_type: "text/plain; charset=utf-16be",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\x00\x00",
        pattern: b"\xFF\xFE\x00\x00",
        skip_ws: false,
        content_type: "text/plain; charset=utf-16le",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\x00",
        pattern: b"\xEF\xBB\xBF\x00",
        skip_ws: false,
        content_type: TEXT_PLAIN_UTF8,
    },
    // Images
    Signature::Exact(b"\x00\x00\x01\x00", "image/x-icon"),
    Signature::Exact(b"\x00\x00\x02\x00", "image/x-icon"),
    Signature::Exact(b"BM", "image/bmp"),
    Signature::Exact(b"GIF87a", "image/gif"),
    Signature::Exact(b"GIF89a", "image/gif"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WEBPVP",
        skip_ws: false,
        content_type: "image/webp",
    },
    Signature::Exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    Signature::Exact(b"\xFF\xD8\xFF", "image/jpeg"),
    // Audio and video
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"FORM\x00\x00\x00\x00AIFF",
        skip_ws: false,
        content_type: "audio/aiff",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF",
        pattern: b"ID3",
        skip_ws: false,
        content_type: "audio/mpeg",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF",
        pattern: b"OggS\x00",
        skip_ws: false,
        content_type: "application/ogg",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF",
        pattern: b"MThd\x00\x00\x00\x06",
        skip_ws: false,
        content_type: "audio/midi",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00AVI ",
        skip_ws: false,
        content_type: "video/avi",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WAVE",
        skip_ws: false,
        content_type: "audio/wave",
    },
    Signature::Mp4,
    Signature::Exact(b"\x1A\x45\xDF\xA3", "video/webm"),
    // Fonts
    Signature::Masked {
        mask: EOT_MASK,
        pattern: EOT_PATTERN,
        skip_ws: false,
        content_type: "application/vnd.ms-fontobject",
    },
    Signature::Exact(b"\x00\x01\x00\x00", "font/ttf"),
    Signature::Exact(b"OTTO", "font/otf"),
    Signature::Exact(b"ttcf", "font/collection"),
    Signature::Exact(b"wOFF", "font/woff"),
    Signature::Exact(b"wOF2", "font/woff2"),
    // Archives
    Signature::Exact(b"\x1F\x8B\x08", "application/x-gzip"),
    Signature::Exact(b"PK\x03\x04", "application/zip"),
    Signature::Exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    Signature::Exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    Signature::Exact(b"\x00\x61\x73\x6D", "application/wasm"),
    Signature::Text,
];

/// Detects the content type of `data` from its leading bytes.
///
/// Always returns a valid MIME type; unknown binary data is reported as
/// `application/octet-stream`.
#[must_use]
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];
    let first_non_ws = data
        .iter()
        .position(|b| !is_whitespace(*b))
        .unwrap_or(data.len());

    SIGNATURES
        .iter()
        .find_map(|sig| sig.matches(data, first_non_ws))
        .unwrap_or(OCTET_STREAM)
}

impl Signature {
    fn matches(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        match self {
            Self::Html(tag) => html_matches(&data[first_non_ws..], tag).then_some(TEXT_HTML),
            Self::Masked {
                mask,
                pattern,
                skip_ws,
                content_type,
            } => {
                let data = if *skip_ws { &data[first_non_ws..] } else { data };
                masked_matches(data, mask, pattern).then_some(*content_type)
            }
            Self::Exact(prefix, content_type) => data.starts_with(prefix).then_some(*content_type),
            Self::Mp4 => mp4_matches(data).then_some("video/mp4"),
            Self::Text => data[first_non_ws..]
                .iter()
                .all(|b| !is_binary(*b))
                .then_some(TEXT_PLAIN_UTF8),
        }
    }
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

const fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

fn html_matches(data: &[u8], tag: &[u8]) -> bool {
    if data.len() < tag.len() + 1 {
        return false;
    }

    let name_matches = tag.iter().zip(data).all(|(t, d)| {
        if t.is_ascii_uppercase() {
            *t == d & 0xDF
        } else {
            t == d
        }
    });

    name_matches && matches!(data[tag.len()], b' ' | b'>')
}

fn masked_matches(data: &[u8], mask: &[u8], pattern: &[u8]) -> bool {
    data.len() >= mask.len()
        && pattern
            .iter()
            .zip(mask)
            .zip(data)
            .all(|((p, m), d)| d & m == *p)
}

fn mp4_matches(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }

    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }

    // Brands start at offset 8; offset 12 holds the minor version.
    (8..box_size)
        .step_by(4)
        .filter(|offset| *offset != 12)
        .any(|offset| &data[offset..offset + 3] == b"mp4")
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
    fn test_empty_is_text() {
        assert_eq!(detect_content_type(b""), TEXT_PLAIN_UTF8);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(detect_content_type(b"Hello, World!\n"), TEXT_PLAIN_UTF8);
        assert_eq!(detect_content_type("Grüße\r\n".as_bytes()), TEXT_PLAIN_UTF8);
    }

    #[test]
    fn test_binary_fallback() {
        assert_eq!(detect_content_type(b"\x01\x02\x03\x04garbage"), OCTET_STREAM);
        assert_eq!(detect_content_type(b"text then \x00 nul"), OCTET_STREAM);
    }

    #[test]
    fn test_html() {
        assert_eq!(detect_content_type(b"<html><body>hi</body></html>"), TEXT_HTML);
        assert_eq!(detect_content_type(b"  \n<!DOCTYPE html>"), TEXT_HTML);
        assert_eq!(detect_content_type(b"<p class=x>para</p>"), TEXT_HTML);
        assert_eq!(detect_content_type(b"<!-- comment -->"), TEXT_HTML);
        // Tag name must be terminated by space or '>'.
        assert_eq!(detect_content_type(b"<paragraph>"), TEXT_PLAIN_UTF8);
        // Too short to include the terminator.
        assert_eq!(detect_content_type(b"<html"), TEXT_PLAIN_UTF8);
    }

    #[test]
    fn test_xml() {
        assert_eq!(
            detect_content_type(b"\n<?xml version=\"1.0\"?><root/>"),
            "text/xml; charset=utf-8"
        );
    }

    #[test]
    fn test_documents() {
        assert_eq!(detect_content_type(b"%PDF-1.7\n%\xE2\xE3"), "application/pdf");
        assert_eq!(
            detect_content_type(b"%!PS-Adobe-3.0"),
            "application/postscript"
        );
    }

    #[test]
    fn test_byte_order_marks() {
        assert_eq!(
            detect_content_type(b"\xFE\xFF\x00h"),
            "text/plain; charset=utf-16be"
        );
        assert_eq!(
            detect_content_type(b"\xFF\xFEh\x00"),
            "text/plain; charset=utf-16le"
        );
        assert_eq!(detect_content_type(b"\xEF\xBB\xBFhello"), TEXT_PLAIN_UTF8);
    }

    #[test]
    fn test_images() {
        assert_eq!(
            detect_content_type(b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR"),
            "image/png"
        );
        assert_eq!(detect_content_type(b"\xFF\xD8\xFF\xE0\x00\x10JFIF"), "image/jpeg");
        assert_eq!(detect_content_type(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(detect_content_type(b"GIF87a\x01\x00"), "image/gif");
        assert_eq!(detect_content_type(b"BM\x00\x00"), "image/bmp");
        assert_eq!(detect_content_type(b"\x00\x00\x01\x00\x01\x00"), "image/x-icon");
        assert_eq!(
            detect_content_type(b"RIFF\x24\x00\x00\x00WEBPVP8 "),
            "image/webp"
        );
    }

    #[test]
    fn test_audio_video() {
        assert_eq!(detect_content_type(b"ID3\x04\x00"), "audio/mpeg");
        assert_eq!(detect_content_type(b"OggS\x00\x02"), "application/ogg");
        assert_eq!(
            detect_content_type(b"MThd\x00\x00\x00\x06\x00\x01"),
            "audio/midi"
        );
        assert_eq!(
            detect_content_type(b"RIFF\x10\x00\x00\x00WAVEfmt "),
            "audio/wave"
        );
        assert_eq!(
            detect_content_type(b"RIFF\x10\x00\x00\x00AVI LIST"),
            "video/avi"
        );
        assert_eq!(
            detect_content_type(b"FORM\x00\x00\x00\x10AIFFCOMM"),
            "audio/aiff"
        );
        assert_eq!(detect_content_type(b"\x1A\x45\xDF\xA3\x01"), "video/webm");
    }

    #[test]
    fn test_mp4() {
        let mp4 = b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom";
        assert_eq!(detect_content_type(mp4), "video/mp4");

        // Brand only at the minor-version slot does not count.
        let minor_only = b"\x00\x00\x00\x10ftypqt  mp41";
        assert_eq!(detect_content_type(minor_only), OCTET_STREAM);

        // Declared box larger than the data.
        let truncated = b"\x00\x00\x00\x40ftypmp42\x00\x00\x00\x00";
        assert_eq!(detect_content_type(truncated), OCTET_STREAM);

        // A 256-byte box size starts with the icon signature.
        let icon_prefix = b"\x00\x00\x01\x00ftypmp42\x00\x00\x00\x00";
        assert_eq!(detect_content_type(icon_prefix), "image/x-icon");
    }

    #[test]
    fn test_fonts() {
        assert_eq!(detect_content_type(b"\x00\x01\x00\x00\x00\x0E"), "font/ttf");
        assert_eq!(detect_content_type(b"OTTO\x00\x0B"), "font/otf");
        assert_eq!(detect_content_type(b"ttcf\x00\x01"), "font/collection");
        assert_eq!(detect_content_type(b"wOFF\x00\x01"), "font/woff");
        assert_eq!(detect_content_type(b"wOF2\x00\x01"), "font/woff2");

        let mut eot = vec![0x01; 34];
        eot.extend_from_slice(b"LP\x00\x00");
        assert_eq!(
            detect_content_type(&eot),
            "application/vnd.ms-fontobject"
        );
    }

    #[test]
    fn test_archives() {
        assert_eq!(detect_content_type(b"\x1F\x8B\x08\x00"), "application/x-gzip");
        assert_eq!(detect_content_type(b"PK\x03\x04\x14\x00"), "application/zip");
        assert_eq!(
            detect_content_type(b"Rar!\x1A\x07\x00\xCF"),
            "application/x-rar-compressed"
        );
        assert_eq!(
            detect_content_type(b"Rar!\x1A\x07\x01\x00\x33"),
            "application/x-rar-compressed"
        );
        assert_eq!(
            detect_content_type(b"\x00asm\x01\x00\x00\x00"),
            "application/wasm"
        );
    }

    #[test]
    fn test_only_prefix_is_inspected() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(detect_content_type(&data), TEXT_PLAIN_UTF8);
    }

    #[test]
    fn test_deterministic() {
        let data = b"\x89PNG\r\n\x1a\nrest";
        assert_eq!(detect_content_type(data), detect_content_type(data));
    }
}
