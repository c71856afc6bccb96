//! Reference and container field kinds.

use super::{Field, FieldKind, fallback_or_fail};
use crate::entity::Entity;
use crate::error::{AdaptError, ModelResult};
use crate::reference::{Reference, ResolvedTarget};
use crate::registry;
use crate::schema::Schema;
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

/// Field whose value is a nested entity.
///
/// The target schema is resolved lazily on first use, which lets schemas
/// reference themselves and each other before they are all defined.
pub struct EntityField {
    reference: Reference,
    resolved: OnceLock<ResolvedTarget>,
}

impl EntityField {
    #[must_use]
    pub fn new(target: impl Into<Reference>) -> Self {
        Self {
            reference: target.into(),
            resolved: OnceLock::new(),
        }
    }

    /// The reference this field was declared with.
    #[must_use]
    pub const fn reference(&self) -> &Reference {
        &self.reference
    }

    /// Resolves the target schema.
    pub fn schema(&self) -> ModelResult<Arc<Schema>> {
        if let Some(resolved) = self.resolved.get() {
            return resolved.upgrade();
        }
        let schema = self.reference.resolve()?;
        if matches!(self.reference, Reference::Named(_)) {
            let _ = self.resolved.set(ResolvedTarget::Strong(Arc::clone(&schema)));
        }
        Ok(schema)
    }

    fn adapt_to(&self, schema: &Arc<Schema>, value: Value) -> ModelResult<Value> {
        if let Value::Entity(entity) = &value {
            if entity.schema().is_a(schema) {
                return Ok(value);
            }
        }
        if let Value::Custom(custom) = &value {
            if let Some(Value::Entity(entity)) = custom.adapt_to(FieldKind::Entity) {
                if entity.schema().is_a(schema) {
                    return Ok(Value::Entity(entity));
                }
            }
        }
        if let Some(result) = schema.adapt_hook(&value) {
            return result.map(Value::Entity);
        }
        if let Some(convert) = registry::adapter(FieldKind::Entity, value.value_type()) {
            let converted = convert(&value)?;
            return match converted {
                Value::Entity(entity) if entity.schema().is_a(schema) => Ok(Value::Entity(entity)),
                other => Err(AdaptError::to_target(&other, schema.name()).into()),
            };
        }
        match value {
            Value::Map(map) => Ok(Value::Entity(Entity::with_values(Arc::clone(schema), map)?)),
            Value::Entity(other) => Ok(Value::Entity(Entity::with_values(
                Arc::clone(schema),
                other.flatten(),
            )?)),
            other => match registry::fallback(&other, FieldKind::Entity) {
                Some(result) => Ok(result?),
                None => Err(AdaptError::to_target(&other, schema.name()).into()),
            },
        }
    }
}

impl Field for EntityField {
    fn kind(&self) -> FieldKind {
        FieldKind::Entity
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        if value.is_absent() {
            return Ok(value);
        }
        let schema = self.schema()?;
        self.adapt_to(&schema, value)
    }

    fn flatten(&self, value: &Value) -> Value {
        match value {
            Value::Entity(entity) => Value::Map(entity.flatten()),
            other => other.clone(),
        }
    }

    fn jsonify(&self, value: &Value) -> ModelResult<serde_json::Value> {
        match value {
            Value::Entity(entity) => Ok(serde_json::Value::Object(entity.jsonify()?)),
            Value::Null | Value::Empty => Ok(serde_json::Value::Null),
            other => Err(AdaptError::new(other, FieldKind::Entity).into()),
        }
    }

    fn bind(&self, owner: &Weak<Schema>) {
        if matches!(self.reference, Reference::Owner) {
            let _ = self.resolved.set(ResolvedTarget::Owner(Weak::clone(owner)));
        }
    }

    fn as_entity_field(&self) -> Option<&EntityField> {
        Some(self)
    }
}

impl fmt::Debug for EntityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityField")
            .field("reference", &self.reference)
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}

/// Field holding an ordered sequence of values of one inner kind.
#[derive(Debug, Clone)]
pub struct CollectionField {
    inner: Arc<dyn Field>,
}

impl CollectionField {
    #[must_use]
    pub fn new(inner: Arc<dyn Field>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn inner(&self) -> &dyn Field {
        self.inner.as_ref()
    }
}

impl Field for CollectionField {
    fn kind(&self) -> FieldKind {
        FieldKind::Collection
    }

    fn adapt(&self, value: Value) -> ModelResult<Value> {
        match value {
            Value::Null | Value::Empty => Ok(value),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.inner.adapt(item))
                .collect::<ModelResult<Vec<_>>>()
                .map(Value::List),
            other => fallback_or_fail(FieldKind::Collection, &other),
        }
    }

    fn flatten(&self, value: &Value) -> Value {
        match value {
            Value::List(items) => Value::List(items.iter().map(|v| self.inner.flatten(v)).collect()),
            other => other.clone(),
        }
    }

    fn jsonify(&self, value: &Value) -> ModelResult<serde_json::Value> {
        match value {
            Value::List(items) => items
                .iter()
                .map(|v| self.inner.jsonify(v))
                .collect::<ModelResult<Vec<_>>>()
                .map(serde_json::Value::Array),
            Value::Null | Value::Empty => Ok(serde_json::Value::Null),
            other => Err(AdaptError::new(other, FieldKind::Collection).into()),
        }
    }

    fn bind(&self, owner: &Weak<Schema>) {
        self.inner.bind(owner);
    }
}
