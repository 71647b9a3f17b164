//! # dropmail-mime
//!
//! Encoding of outgoing email for mail APIs that accept a base64 `raw`
//! message, such as the Gmail `users.messages.send` endpoint.
//!
//! ## Features
//!
//! - **Plain messages**: `From`/`To`/`Subject` headers and a text body
//! - **Attachments**: `multipart/mixed` with one text part and one file
//! - **Boundaries**: CSPRNG tokens over a closed set of alphabets
//! - **Content sniffing**: WHATWG-compatible detection over the first 512 bytes
//! - **Inspection**: Parse encoded messages back into headers and parts
//!
//! ## Quick Start
//!
//! ### Plain Messages
//!
//! ```
//! use dropmail_mime::{EmailEnvelope, encode_plain};
//!
//! let envelope = EmailEnvelope::new("a@x.com", "b@x.com", "Hi");
//! let message = encode_plain(&envelope, "Trial!")?;
//! assert_eq!(
//!     message.decode()?,
//!     b"From: a@x.com\r\nTo: b@x.com\r\nSubject: Hi\r\n\r\nTrial!"
//! );
//! # Ok::<(), dropmail_mime::Error>(())
//! ```
//!
//! ### Attachments
//!
//! ```
//! use dropmail_mime::{Attachment, EmailEnvelope, ParsedMessage, encode_with_attachment};
//!
//! let envelope = EmailEnvelope::new("a@x.com", "b@x.com", "Upload");
//! let attachment = Attachment::new("hello.txt", b"Hello, World!".to_vec());
//! let message = encode_with_attachment(&envelope, "You just uploaded this file!", &attachment)?;
//!
//! let parsed = ParsedMessage::from_encoded(&message)?;
//! let file = parsed.attachments().next().expect("attachment part");
//! assert_eq!(file.file_name().as_deref(), Some("hello.txt"));
//! assert_eq!(file.decode_body()?, b"Hello, World!");
//! # Ok::<(), dropmail_mime::Error>(())
//! ```
//!
//! ### Encoding
//!
//! ```
//! use dropmail_mime::encoding::{chunk_lines, wrap_base64};
//!
//! assert_eq!(chunk_lines("abcdefg", 3, "\n")?, "abc\ndef\ng\n");
//! assert_eq!(wrap_base64(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==\n");
//! # Ok::<(), dropmail_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod compose;
mod content_type;
mod error;
mod header;
mod message;

pub mod boundary;
pub mod encoding;
pub mod parse;
pub mod sniff;

pub use boundary::{BoundaryAlphabet, generate_boundary, generate_token};
pub use compose::{AttachmentEncoder, encode_plain, encode_with_attachment};
pub use content_type::ContentType;
pub use encoding::Base64Alphabet;
pub use error::{Error, Result};
pub use header::{Headers, validate_header_value};
pub use message::{Attachment, EmailEnvelope, EncodedMessage};
pub use parse::{ParsedMessage, Part, TransferEncoding};
pub use sniff::detect_content_type;
