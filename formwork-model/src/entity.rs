//! Entity instances: the value store behind a schema.

use crate::error::{ModelError, ModelResult};
use crate::fields::{FieldKind, FieldSpec};
use crate::path;
use crate::registry;
use crate::schema::Schema;
use crate::value::{Value, float_to_json};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

fn next_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}

/// An instance of a [`Schema`].
///
/// Stored values are always adapted. A name mapped to [`Value::Empty`] is
/// never stored: writing `Empty` removes the name.
///
/// Equality compares schema and stored values; hashing uses the instance
/// identity, so equal entities may hash differently. Values are mutable
/// after construction, which rules out value-based hashing.
pub struct Entity {
    schema: Arc<Schema>,
    values: BTreeMap<String, Value>,
    changes: BTreeSet<String>,
    flex_fields: BTreeSet<String>,
    identity: u64,
}

impl Entity {
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
            changes: BTreeSet::new(),
            flex_fields: BTreeSet::new(),
            identity: next_identity(),
        }
    }

    /// Creates an entity and merges `values` into it with [`Entity::update`].
    pub fn with_values<K, V>(
        schema: Arc<Schema>,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> ModelResult<Self>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut entity = Self::new(schema);
        entity.update(values)?;
        Ok(entity)
    }

    pub(crate) fn from_parts(
        schema: Arc<Schema>,
        values: BTreeMap<String, Value>,
        changes: BTreeSet<String>,
        flex_fields: BTreeSet<String>,
    ) -> Self {
        Self {
            schema,
            values,
            changes,
            flex_fields,
            identity: next_identity(),
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    #[must_use]
    pub fn is_flexible(&self) -> bool {
        self.schema.is_flexible()
    }

    /// Per-instance identity, the basis of [`Hash`].
    #[must_use]
    pub const fn identity(&self) -> u64 {
        self.identity
    }

    // ── Attribute access ─────────────────────────────────────────

    /// Reads an attribute: a declared field (falling back to its default),
    /// an alias, or on flexible entities any stored name.
    pub fn get(&self, name: &str) -> ModelResult<Value> {
        if let Some(spec) = self.schema.field(name) {
            return read_field(&self.values, name, spec).map(Cow::into_owned);
        }
        if let Some(alias) = self.schema.alias(name) {
            return alias.get(self);
        }
        if self.is_flexible() {
            return Ok(self.values.get(name).cloned().unwrap_or_default());
        }
        Err(self.undeclared(name))
    }

    /// Like [`Entity::get`], returning `default` for undeclared names.
    pub fn get_or(&self, name: &str, default: impl Into<Value>) -> ModelResult<Value> {
        match self.get(name) {
            Err(ModelError::UndeclaredField { .. }) => Ok(default.into()),
            other => other,
        }
    }

    /// Reads several names into a mapping.
    ///
    /// Without `include_empty` only stored values are returned. With it,
    /// every name is read like [`Entity::get_or`].
    pub fn get_many<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
        default: impl Into<Value>,
        include_empty: bool,
    ) -> ModelResult<BTreeMap<String, Value>> {
        let default = default.into();
        let mut found = BTreeMap::new();
        for name in names {
            if include_empty {
                found.insert(name.to_string(), self.get_or(name, default.clone())?);
            } else if let Some(value) = self.values.get(name).filter(|v| !v.is_empty_marker()) {
                found.insert(name.to_string(), value.clone());
            }
        }
        Ok(found)
    }

    /// Writes an attribute, adapting declared fields.
    ///
    /// Writing [`Value::Empty`] removes the stored value. Undeclared names
    /// are stored raw on flexible entities and rejected otherwise.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let value = value.into();
        let schema = Arc::clone(&self.schema);
        if let Some(spec) = schema.field(name) {
            let value = if value.is_empty_marker() {
                value
            } else {
                spec.adapt(value)?
            };
            self.flex_fields.remove(name);
            self.store(name, value);
            return Ok(());
        }
        if let Some(alias) = schema.alias(name) {
            return alias.set(self, value);
        }
        if schema.is_flexible() {
            if value.is_empty_marker() {
                self.flex_fields.remove(name);
            } else {
                self.flex_fields.insert(name.to_string());
            }
            self.store(name, value);
            return Ok(());
        }
        Err(self.undeclared(name))
    }

    fn store(&mut self, name: &str, value: Value) {
        if value.is_empty_marker() {
            self.values.remove(name);
        } else {
            self.values.insert(name.to_string(), value);
        }
        self.changes.insert(name.to_string());
    }

    fn undeclared(&self, name: &str) -> ModelError {
        ModelError::UndeclaredField {
            schema: self.schema.name().to_string(),
            field: name.to_string(),
        }
    }

    /// A declared field's stored value, or its default when nothing is stored.
    pub(crate) fn read_declared(&self, name: &str) -> ModelResult<Cow<'_, Value>> {
        match self.schema.field(name) {
            Some(spec) => read_field(&self.values, name, spec),
            None => Err(ModelError::UnknownField {
                path: name.to_string(),
            }),
        }
    }

    // ── Dot notation ─────────────────────────────────────────────

    /// Reads a dotted path such as `child?.pos.top`.
    pub fn get_path(&self, path: &str) -> ModelResult<Value> {
        path::get(self, path)
    }

    /// Writes a dotted path, creating missing intermediate entities.
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) -> ModelResult<()> {
        path::set(self, path, value.into())
    }

    /// Writes every key through [`Entity::set_path`], skipping unknown fields.
    pub fn update<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>) -> ModelResult<()>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (key, value) in values {
            let key = key.as_ref();
            match self.set_path(key, value) {
                Err(ModelError::UnknownField { path }) => {
                    trace!(schema = self.schema.name(), key, path = %path, "Skipping unknown field");
                }
                other => other?,
            }
        }
        Ok(())
    }

    /// Merges another entity's stored values.
    pub fn update_from(&mut self, other: &Entity) -> ModelResult<()> {
        self.update(other.values.iter().map(|(k, v)| (k.as_str(), v.clone())))
    }

    // ── Mapping interface ────────────────────────────────────────

    /// Removes a stored value. Undeclared names are an error on strict entities.
    pub fn remove(&mut self, name: &str) -> ModelResult<Option<Value>> {
        if !self.schema.fields().contains(name) && !self.is_flexible() {
            return Err(ModelError::UnknownField {
                path: name.to_string(),
            });
        }
        self.flex_fields.remove(name);
        Ok(self.values.remove(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Drops every stored value. Changes are kept.
    pub fn clear(&mut self) {
        self.values.clear();
        self.flex_fields.clear();
    }

    /// The raw stored value, without defaults.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The stored nested entity under `name`.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.values.get(name).and_then(Value::as_entity)
    }

    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.values.get_mut(name).and_then(Value::as_entity_mut)
    }

    /// Names written since construction.
    #[must_use]
    pub const fn changes(&self) -> &BTreeSet<String> {
        &self.changes
    }

    /// Stored names outside the declared schema.
    #[must_use]
    pub const fn flex_fields(&self) -> &BTreeSet<String> {
        &self.flex_fields
    }

    pub(crate) const fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    // ── Conversion ───────────────────────────────────────────────

    /// Stored values as plain data.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(name, value)| {
                let flat = match self.schema.field(name) {
                    Some(spec) => spec.flatten(value),
                    None => flatten_loose(value),
                };
                (name.clone(), flat)
            })
            .collect()
    }

    /// Stored values as a JSON object.
    pub fn jsonify(&self) -> ModelResult<serde_json::Map<String, serde_json::Value>> {
        self.values
            .iter()
            .map(|(name, value)| {
                let json = match self.schema.field(name) {
                    Some(spec) => spec.jsonify(value)?,
                    None => jsonify_loose(value)?,
                };
                Ok((name.clone(), json))
            })
            .collect()
    }

    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string(&self.jsonify()?)?)
    }

    /// Parses a JSON object and builds an entity from it.
    pub fn from_json(schema: Arc<Schema>, json: &str) -> ModelResult<Self> {
        let data: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        Self::with_values(schema, data)
    }
}

fn read_field<'a>(
    values: &'a BTreeMap<String, Value>,
    name: &str,
    spec: &FieldSpec,
) -> ModelResult<Cow<'a, Value>> {
    match values.get(name) {
        None | Some(Value::Empty) => spec.default_value().map(Cow::Owned),
        Some(value) => Ok(Cow::Borrowed(value)),
    }
}

/// Best-effort plain rendering of a value stored outside the schema.
fn flatten_loose(value: &Value) -> Value {
    match value {
        Value::Null | Value::Empty => Value::Null,
        Value::Entity(entity) => Value::Map(entity.flatten()),
        Value::List(items) => Value::List(items.iter().map(flatten_loose).collect()),
        Value::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), flatten_loose(v)))
                .collect(),
        ),
        other => match registry::kind_for_type(other.value_type())
            .and_then(FieldKind::default_field)
        {
            Some(field) => field.flatten(other),
            None => match other {
                Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Text(_) | Value::Bytes(_) => {
                    other.clone()
                }
                _ => Value::Text(other.to_string()),
            },
        },
    }
}

/// Best-effort JSON rendering of a value stored outside the schema.
fn jsonify_loose(value: &Value) -> ModelResult<serde_json::Value> {
    match value {
        Value::Null | Value::Empty => Ok(serde_json::Value::Null),
        Value::Entity(entity) => Ok(serde_json::Value::Object(entity.jsonify()?)),
        Value::List(items) => items
            .iter()
            .map(jsonify_loose)
            .collect::<ModelResult<Vec<_>>>()
            .map(serde_json::Value::Array),
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), jsonify_loose(v)?)))
            .collect::<ModelResult<serde_json::Map<_, _>>>()
            .map(serde_json::Value::Object),
        other => {
            let field = registry::kind_for_type(other.value_type())
                .and_then(FieldKind::default_field);
            match (field, other) {
                (Some(field), _) => field.jsonify(other),
                (None, Value::Float(f)) => float_to_json(other, *f),
                (None, Value::Decimal(_) | Value::Bytes(_) | Value::Custom(_)) => {
                    Ok(serde_json::Value::String(other.to_string()))
                }
                (None, _) => other.to_json(),
            }
        }
    }
}

impl Clone for Entity {
    /// Copies the stored state into an entity with a fresh identity.
    fn clone(&self) -> Self {
        Self::from_parts(
            Arc::clone(&self.schema),
            self.values.clone(),
            self.changes.clone(),
            self.flex_fields.clone(),
        )
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.values == other.values
    }
}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("schema", &self.schema.name())
            .field("values", &self.values)
            .field("changes", &self.changes)
            .field("flex_fields", &self.flex_fields)
            .finish_non_exhaustive()
    }
}

/// Renders as `<Name {key: value, ...}>`.
impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {{", self.schema.name())?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}>")
    }
}
