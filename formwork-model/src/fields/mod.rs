//! The field type hierarchy.
//!
//! A [`Field`] is the adaptation contract of one field kind: it turns input
//! into a canonical [`Value`], flattens canonical values into plain data and
//! renders them as JSON. A [`FieldSpec`] pairs a field with its default and
//! documentation, and is what a schema stores per attribute name.
//!
//! Scalar kinds share one ordered adaptation algorithm ([`adapt_value`]):
//! 1. already canonical: accepted unchanged
//! 2. the value can adapt itself ([`CustomValue::adapt_to`])
//! 3. the target type can adapt the value (entity schemas only)
//! 4. a converter registered for (kind, input type)
//! 5. the generic fallback adapter, if one is installed
//! 6. otherwise an [`AdaptError`]
//!
//! [`CustomValue::adapt_to`]: crate::value::CustomValue::adapt_to

mod bytes;
mod entity;
mod scalar;

pub use bytes::BytesField;
pub use entity::{CollectionField, EntityField};
pub use scalar::{
    BoolField, DateTimeField, EmailField, FloatField, IdField, IntField, SlugField, StringField,
    UrlField,
};

use crate::error::{AdaptError, ModelResult};
use crate::reference::Reference;
use crate::registry;
use crate::schema::Schema;
use crate::value::Value;
use formwork_types::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};

/// The kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Id,
    Int,
    Float,
    Bool,
    String,
    Slug,
    Email,
    Url,
    DateTime,
    Bytes,
    Entity,
    Collection,
}

impl FieldKind {
    /// The kind whose registered adapters this kind inherits.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Slug | Self::Email | Self::Url => Some(Self::String),
            _ => None,
        }
    }

    /// A default-constructed field of this kind.
    ///
    /// Entity and collection fields need a target and have no default form.
    #[must_use]
    pub fn default_field(self) -> Option<Arc<dyn Field>> {
        Some(match self {
            Self::Id => Arc::new(IdField),
            Self::Int => Arc::new(IntField),
            Self::Float => Arc::new(FloatField),
            Self::Bool => Arc::new(BoolField),
            Self::String => Arc::new(StringField),
            Self::Slug => Arc::new(SlugField),
            Self::Email => Arc::new(EmailField),
            Self::Url => Arc::new(UrlField),
            Self::DateTime => Arc::new(DateTimeField),
            Self::Bytes => Arc::new(BytesField::default()),
            Self::Entity | Self::Collection => return None,
        })
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Id => "id",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Slug => "slug",
            Self::Email => "email",
            Self::Url => "url",
            Self::DateTime => "date_time",
            Self::Bytes => "bytes",
            Self::Entity => "entity",
            Self::Collection => "collection",
        })
    }
}

/// Adaptation and conversion contract of a field kind.
///
/// The provided methods are the base contract: no coercion, identity
/// flatten and structural JSON.
pub trait Field: fmt::Debug + Send + Sync {
    fn kind(&self) -> FieldKind;

    /// Converts `value` into this field's canonical representation.
    fn adapt(&self, value: Value) -> ModelResult<Value> {
        Ok(value)
    }

    /// Converts a canonical value into plain data.
    fn flatten(&self, value: &Value) -> Value {
        value.clone()
    }

    /// Converts a canonical value into a JSON-compatible value.
    fn jsonify(&self, value: &Value) -> ModelResult<serde_json::Value> {
        value.to_json()
    }

    /// One-time hook run when the owning schema is built.
    fn bind(&self, owner: &Weak<Schema>) {
        let _ = owner;
    }

    /// Downcast used by the path resolver.
    fn as_entity_field(&self) -> Option<&EntityField> {
        None
    }
}

/// Runs the shared scalar adaptation algorithm for `kind`.
pub(crate) fn adapt_value(
    kind: FieldKind,
    value: Value,
    is_canonical: impl Fn(&Value) -> bool,
) -> ModelResult<Value> {
    if value.is_absent() || is_canonical(&value) {
        return Ok(value);
    }
    if let Value::Custom(custom) = &value {
        if let Some(adapted) = custom.adapt_to(kind).filter(|v| is_canonical(v)) {
            return Ok(adapted);
        }
    }
    if let Some(convert) = registry::adapter(kind, value.value_type()) {
        return Ok(convert(&value)?);
    }
    fallback_or_fail(kind, &value)
}

/// Steps 5 and 6: the generic fallback adapter, then failure.
pub(crate) fn fallback_or_fail(kind: FieldKind, value: &Value) -> ModelResult<Value> {
    match registry::fallback(value, kind) {
        Some(result) => Ok(result?),
        None => Err(AdaptError::new(value, kind).into()),
    }
}

/// Type-erased factory for lazily computed defaults.
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// The default of a field, used when no value is stored.
#[derive(Clone, Default)]
pub enum DefaultValue {
    #[default]
    None,
    /// A literal, adapted once when declared.
    Value(Value),
    /// Called and adapted on every read that falls back to the default.
    Factory(DefaultFactory),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// A declared field: adaptation contract, default and documentation.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    field: Arc<dyn Field>,
    default: DefaultValue,
    doc: Option<String>,
}

impl FieldSpec {
    /// Wraps a field implementation with no default and no doc.
    #[must_use]
    pub fn new(field: impl Field + 'static) -> Self {
        Self::from_arc(Arc::new(field))
    }

    #[must_use]
    pub fn from_arc(field: Arc<dyn Field>) -> Self {
        Self {
            field,
            default: DefaultValue::None,
            doc: None,
        }
    }

    #[must_use]
    pub fn id() -> Self {
        Self::new(IdField)
    }

    #[must_use]
    pub fn int() -> Self {
        Self::new(IntField)
    }

    #[must_use]
    pub fn float() -> Self {
        Self::new(FloatField)
    }

    #[must_use]
    pub fn bool() -> Self {
        Self::new(BoolField)
    }

    #[must_use]
    pub fn string() -> Self {
        Self::new(StringField)
    }

    #[must_use]
    pub fn slug() -> Self {
        Self::new(SlugField)
    }

    #[must_use]
    pub fn email() -> Self {
        Self::new(EmailField)
    }

    #[must_use]
    pub fn url() -> Self {
        Self::new(UrlField)
    }

    #[must_use]
    pub fn datetime() -> Self {
        Self::new(DateTimeField)
    }

    /// A bytes field rendering through `encoding`.
    #[must_use]
    pub fn bytes(encoding: Encoding) -> Self {
        Self::new(BytesField::new(encoding))
    }

    /// A nested entity field. Accepts a schema, `"self"` or a dotted name.
    #[must_use]
    pub fn entity(target: impl Into<Reference>) -> Self {
        Self::new(EntityField::new(target))
    }

    /// A collection whose elements use `inner`'s field kind.
    #[must_use]
    pub fn collection(inner: impl Into<FieldSpec>) -> Self {
        Self::new(CollectionField::new(inner.into().field))
    }

    /// Sets a literal default, adapting it now.
    ///
    /// `Null` and `Empty` are stored as given.
    pub fn with_default(mut self, default: impl Into<Value>) -> ModelResult<Self> {
        let default = default.into();
        let default = if default.is_absent() {
            default
        } else {
            self.field.adapt(default)?
        };
        self.default = DefaultValue::Value(default);
        Ok(self)
    }

    /// Sets a default computed on demand.
    #[must_use]
    pub fn with_default_fn(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = DefaultValue::Factory(Arc::new(factory));
        self
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.field.kind()
    }

    #[must_use]
    pub fn field(&self) -> &dyn Field {
        self.field.as_ref()
    }

    #[must_use]
    pub const fn declared_default(&self) -> &DefaultValue {
        &self.default
    }

    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn adapt(&self, value: impl Into<Value>) -> ModelResult<Value> {
        self.field.adapt(value.into())
    }

    #[must_use]
    pub fn flatten(&self, value: &Value) -> Value {
        self.field.flatten(value)
    }

    pub fn jsonify(&self, value: &Value) -> ModelResult<serde_json::Value> {
        self.field.jsonify(value)
    }

    /// The value a read returns when nothing is stored.
    pub(crate) fn default_value(&self) -> ModelResult<Value> {
        let value = match &self.default {
            DefaultValue::None => Value::Null,
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Factory(factory) => self.field.adapt(factory())?,
        };
        Ok(match value {
            Value::Empty => Value::Null,
            other => other,
        })
    }

    pub(crate) fn bind(&self, owner: &Weak<Schema>) {
        self.field.bind(owner);
    }

    pub(crate) fn arc(&self) -> Arc<dyn Field> {
        Arc::clone(&self.field)
    }
}
