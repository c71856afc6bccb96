//! Byte/text codecs used by bytes fields.
//!
//! Binary data travels through JSON as text where every code point is a
//! single byte (0-255). An optional [`Encoding`] is applied on top of that.

use crate::{Error, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text encoding applied to raw bytes before they are rendered as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Standard base64 alphabet with padding.
    #[default]
    Base64,
    /// Lower-case hexadecimal.
    Hex,
    /// No encoding: bytes map one-to-one onto code points.
    #[serde(rename = "none")]
    Raw,
}

impl Encoding {
    /// Encodes raw bytes. The output is always ASCII except for [`Encoding::Raw`].
    #[must_use]
    pub fn encode(&self, raw: &[u8]) -> Vec<u8> {
        match self {
            Self::Base64 => STANDARD.encode(raw).into_bytes(),
            Self::Hex => hex::encode(raw).into_bytes(),
            Self::Raw => raw.to_vec(),
        }
    }

    /// Decodes previously encoded bytes back into raw bytes.
    pub fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Base64 => STANDARD.decode(encoded).map_err(|e| Error::InvalidEncoding {
                encoding: *self,
                reason: e.to_string(),
            }),
            Self::Hex => hex::decode(encoded).map_err(|e| Error::InvalidEncoding {
                encoding: *self,
                reason: e.to_string(),
            }),
            Self::Raw => Ok(encoded.to_vec()),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Base64 => "base64",
            Self::Hex => "hex",
            Self::Raw => "none",
        })
    }
}

/// Maps every code point of `text` onto one byte.
///
/// Fails on the first code point above U+00FF.
pub fn latin1_encode(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).map_err(|_| Error::CodePointOutOfRange(u32::from(c))))
        .collect()
}

/// Maps every byte onto the code point with the same value.
#[must_use]
pub fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}
