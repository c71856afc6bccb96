//! The dynamic value model.
//!
//! Every stored entity value is a [`Value`]. Field kinds adapt arbitrary
//! input values into their canonical variant, flatten them back into plain
//! data and render them as JSON.

use crate::entity::Entity;
use crate::error::{AdaptError, ModelResult};
use crate::fields::FieldKind;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A dynamically typed value held by an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// No value (`None`).
    #[default]
    Null,
    /// Explicitly left empty. Falsy, renders as an empty string, and
    /// removes the stored value when written to a declared field.
    Empty,
    Bool(bool),
    Int(i64),
    /// Non-finite floats persist as the text `NaN`, `inf` or `-inf`.
    #[serde(with = "float_repr")]
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Entity(Entity),
    /// A caller-defined value. Not serializable.
    #[serde(skip)]
    Custom(Arc<dyn CustomValue>),
}

/// Capability interface for caller-defined values.
///
/// A custom value may know how to turn itself into the canonical value of a
/// field kind; returning `None` simply skips that step of adaptation.
pub trait CustomValue: fmt::Debug + fmt::Display + Send + Sync {
    /// Stable name of the type, used as its [`ValueType`] registry key.
    fn type_name(&self) -> &'static str;

    /// Adapts this value to the canonical representation of `kind`.
    fn adapt_to(&self, kind: FieldKind) -> Option<Value> {
        let _ = kind;
        None
    }

    /// Value equality with another custom value.
    fn eq_custom(&self, other: &dyn CustomValue) -> bool {
        let _ = other;
        false
    }
}

impl PartialEq for dyn CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.eq_custom(other)
    }
}

/// The type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Empty,
    Bool,
    Int,
    Float,
    Decimal,
    Text,
    Bytes,
    DateTime,
    List,
    Map,
    Entity,
    Custom(&'static str),
}

impl Value {
    /// Returns the type tag of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Empty => ValueType::Empty,
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Decimal(_) => ValueType::Decimal,
            Self::Text(_) => ValueType::Text,
            Self::Bytes(_) => ValueType::Bytes,
            Self::DateTime(_) => ValueType::DateTime,
            Self::List(_) => ValueType::List,
            Self::Map(_) => ValueType::Map,
            Self::Entity(_) => ValueType::Entity,
            Self::Custom(custom) => ValueType::Custom(custom.type_name()),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for the explicitly-empty sentinel.
    #[must_use]
    pub const fn is_empty_marker(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// True for `Null` and `Empty`, the two "nothing here" values.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Null | Self::Empty)
    }

    /// Truthiness: nothing, false, zero and empty containers are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null | Self::Empty => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Decimal(d) => !d.is_zero(),
            Self::Text(s) => !s.is_empty(),
            Self::Bytes(b) => !b.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
            Self::Entity(entity) => !entity.is_empty(),
            Self::DateTime(_) | Self::Custom(_) => true,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// Structural JSON rendering for values without a field-specific jsonify.
    ///
    /// Bytes and custom values have no JSON form of their own and fail.
    pub fn to_json(&self) -> ModelResult<serde_json::Value> {
        Ok(match self {
            Self::Null | Self::Empty => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => float_to_json(self, *f)?,
            Self::Decimal(d) => {
                let f = d
                    .to_f64()
                    .ok_or_else(|| AdaptError::to_target(self, "JSON number"))?;
                float_to_json(self, f)?
            }
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::DateTime(dt) => serde_json::Value::String(formwork_types::format_date(dt)),
            Self::List(items) => serde_json::Value::Array(
                items.iter().map(Self::to_json).collect::<ModelResult<_>>()?,
            ),
            Self::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<ModelResult<_>>()?,
            ),
            Self::Entity(entity) => serde_json::Value::Object(entity.jsonify()?),
            Self::Bytes(_) | Self::Custom(_) => {
                return Err(AdaptError::to_target(self, "JSON").into());
            }
        })
    }
}

pub(crate) fn float_to_json(value: &Value, f: f64) -> ModelResult<serde_json::Value> {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .ok_or_else(|| AdaptError::to_target(value, "JSON number").into())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Empty => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => f.write_str(&hex::encode(b)),
            Self::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Entity(entity) => write!(f, "{entity}"),
            Self::Custom(custom) => write!(f, "{custom}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        Self::Entity(entity)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Arc<dyn CustomValue>> for Value {
    fn from(custom: Arc<dyn CustomValue>) -> Self {
        Self::Custom(custom)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}


/// JSON has no non-finite numbers, so those floats travel as text.
mod float_repr {
    use serde::de::{self, Deserializer, Visitor};
    use serde::ser::Serializer;
    use std::fmt;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(f: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if f.is_finite() {
            serializer.serialize_f64(*f)
        } else if f.is_nan() {
            serializer.serialize_str("NaN")
        } else if f.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    struct FloatVisitor;

    impl Visitor<'_> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or one of \"NaN\", \"inf\", \"-inf\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}
