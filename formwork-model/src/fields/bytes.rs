//! Raw byte fields.

use super::{Field, FieldKind, fallback_or_fail};
use crate::error::{AdaptError, ModelResult};
use crate::registry;
use crate::value::Value;
use formwork_types::{Encoding, latin1_decode, latin1_encode};

/// Field holding raw bytes.
///
/// In JSON the bytes travel as text: encoded through the configured
/// [`Encoding`] and then read one byte per code point, so arbitrary binary
/// survives a JSON round trip. Text input is decoded the same way back.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesField {
    encoding: Encoding,
}

impl BytesField {
    #[must_use]
    pub const fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn decode_text(&self, text: &str) -> Result<Vec<u8>, AdaptError> {
        let failed = |e: formwork_types::Error| {
            AdaptError::new(&Value::Text(text.to_string()), FieldKind::Bytes).because(e)
        };
        let raw = latin1_encode(text).map_err(failed)?;
        self.encoding.decode(&raw).map_err(failed)
    }
}

impl Field for BytesField {
    fn kind(&self) -> FieldKind {
        FieldKind::Bytes
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        match value {
            Value::Null | Value::Empty | Value::Bytes(_) => Ok(value),
            Value::Text(text) => Ok(Value::Bytes(self.decode_text(&text)?)),
            other => {
                if let Value::Custom(custom) = &other {
                    if let Some(adapted @ Value::Bytes(_)) = custom.adapt_to(FieldKind::Bytes) {
                        return Ok(adapted);
                    }
                }
                if let Some(convert) = registry::adapter(FieldKind::Bytes, other.value_type()) {
                    return Ok(convert(&other)?);
                }
                fallback_or_fail(FieldKind::Bytes, &other)
            }
        }
    }

    fn jsonify(&self, value: &Value) -> ModelResult<serde_json::Value> {
        match value {
            Value::Bytes(raw) => Ok(serde_json::Value::String(latin1_decode(
                &self.encoding.encode(raw),
            ))),
            Value::Null | Value::Empty => Ok(serde_json::Value::Null),
            other => Err(AdaptError::new(other, FieldKind::Bytes).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_text_is_unhexed() {
        let field = BytesField::new(Encoding::Hex);
        assert_eq!(
            field.adapt(Value::from("00ff")).unwrap(),
            Value::Bytes(vec![0x00, 0xff])
        );
    }

    #[test]
    fn wide_text_is_rejected() {
        let field = BytesField::new(Encoding::Raw);
        assert!(field.adapt(Value::from("\u{263a}")).is_err());
    }

    #[test]
    fn text_cannot_be_jsonified_as_bytes() {
        let field = BytesField::default();
        assert!(field.jsonify(&Value::from("abc")).is_err());
    }
}
