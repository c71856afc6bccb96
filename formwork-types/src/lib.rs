//! Pure conversion helpers for formwork.
//!
//! This crate holds the leaf conversions the entity model delegates to and
//! that know nothing about schemas or entities:
//! - RFC3339 date parsing and formatting (UTC)
//! - Byte/text codecs (base64, hex, single-byte "latin1" text)
//! - Slug derivation and URL normalization
//!
//! Everything here is a pure function over its input; no I/O, no shared state.

mod encoding;
mod text;
mod timeutil;

pub use encoding::{Encoding, latin1_decode, latin1_encode};
pub use text::{normalize_url, slugify};
pub use timeutil::{format_date, parse_date, utc_now};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the conversion helpers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid RFC3339 date: {0:?}")]
    InvalidDate(String),

    #[error("code point U+{0:04X} does not fit in a single byte")]
    CodePointOutOfRange(u32),

    #[error("invalid {encoding} text: {reason}")]
    InvalidEncoding { encoding: Encoding, reason: String },

    #[error("invalid URL {0:?}: missing scheme")]
    MissingScheme(String),

    #[error("invalid URL {0:?}: missing network location")]
    MissingHost(String),
}
