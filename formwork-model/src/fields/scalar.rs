//! Scalar field kinds.
//!
//! Conversions between input types (text to int, int to bool, ...) are not
//! hard-coded here: they are the built-in entries of the adapter registry,
//! so a caller can override or extend them per kind.

use super::{Field, FieldKind, adapt_value};
use crate::error::{AdaptError, ModelResult};
use crate::value::Value;

/// Identifier marker field. No coercion beyond the base contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdField;

impl Field for IdField {
    fn kind(&self) -> FieldKind {
        FieldKind::Id
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntField;

impl Field for IntField {
    fn kind(&self) -> FieldKind {
        FieldKind::Int
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        adapt_value(FieldKind::Int, value, |v| matches!(v, Value::Int(_)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloatField;

impl Field for FloatField {
    fn kind(&self) -> FieldKind {
        FieldKind::Float
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        adapt_value(FieldKind::Float, value, |v| matches!(v, Value::Float(_)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolField;

impl Field for BoolField {
    fn kind(&self) -> FieldKind {
        FieldKind::Bool
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        adapt_value(FieldKind::Bool, value, |v| matches!(v, Value::Bool(_)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringField;

impl Field for StringField {
    fn kind(&self) -> FieldKind {
        FieldKind::String
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        adapt_text(FieldKind::String, value)
    }
}

/// Text field for e-mail addresses. Stored as plain text; no validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailField;

impl Field for EmailField {
    fn kind(&self) -> FieldKind {
        FieldKind::Email
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        adapt_text(FieldKind::Email, value)
    }
}

/// Text field holding a URL slug derived from its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugField;

impl Field for SlugField {
    fn kind(&self) -> FieldKind {
        FieldKind::Slug
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        match adapt_text(FieldKind::Slug, value)? {
            Value::Text(text) => Ok(Value::Text(formwork_types::slugify(&text))),
            Value::Null => Ok(Value::Text(String::new())),
            other => Ok(other),
        }
    }
}

/// Text field holding an absolute URL with a lower-cased scheme and host.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlField;

impl Field for UrlField {
    fn kind(&self) -> FieldKind {
        FieldKind::Url
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        match adapt_text(FieldKind::Url, value)? {
            Value::Text(text) => formwork_types::normalize_url(&text)
                .map(Value::Text)
                .map_err(|e| AdaptError::new(&Value::Text(text), FieldKind::Url).because(e).into()),
            other => Ok(other),
        }
    }
}

/// Field holding a UTC datetime. Renders as RFC3339 text in JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeField;

impl Field for DateTimeField {
    fn kind(&self) -> FieldKind {
        FieldKind::DateTime
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        adapt_value(FieldKind::DateTime, value, |v| matches!(v, Value::DateTime(_)))
    }

    fn jsonify(&self, value: &Value) -> ModelResult<serde_json::Value> {
        match value {
            Value::DateTime(dt) => Ok(serde_json::Value::String(formwork_types::format_date(dt))),
            Value::Null | Value::Empty => Ok(serde_json::Value::Null),
            other => Err(AdaptError::new(other, FieldKind::DateTime).into()),
        }
    }
}

fn adapt_text(kind: FieldKind, value: Value) -> ModelResult<Value> {
    adapt_value(kind, value, |v| matches!(v, Value::Text(_)))
}
