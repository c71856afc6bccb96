//! Lossless persistence of entity state.
//!
//! A state captures exactly the value store, change set and flex-field set
//! of an entity. Restoring a state bypasses adaptation: the values are
//! already canonical.

use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::reference;
use crate::schema::Schema;
use crate::value::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// The persisted form of an [`Entity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Catalog name of the entity's schema.
    pub schema: String,
    pub values: BTreeMap<String, Value>,
    #[serde(default)]
    pub changes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub flex_fields: BTreeSet<String>,
}

#[derive(Serialize)]
struct StateRef<'a> {
    schema: &'a str,
    values: &'a BTreeMap<String, Value>,
    changes: &'a BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    flex_fields: &'a BTreeSet<String>,
}

impl Entity {
    fn state_ref(&self) -> StateRef<'_> {
        StateRef {
            schema: self.schema().name(),
            values: self.values(),
            changes: self.changes(),
            flex_fields: self.flex_fields(),
        }
    }

    #[must_use]
    pub fn state(&self) -> EntityState {
        EntityState {
            schema: self.schema().name().to_string(),
            values: self.values().clone(),
            changes: self.changes().clone(),
            flex_fields: self.flex_fields().clone(),
        }
    }

    /// Rebuilds an entity of `schema` from a state, without adaptation.
    #[must_use]
    pub fn restore(schema: Arc<Schema>, state: EntityState) -> Self {
        Self::from_parts(schema, state.values, state.changes, state.flex_fields)
    }

    /// Rebuilds an entity, looking its schema up in the catalog.
    pub fn from_state(state: EntityState) -> ModelResult<Self> {
        let schema = reference::lookup(&state.schema).ok_or_else(|| ModelError::InvalidReference {
            name: state.schema.clone(),
            reason: "no such schema".to_string(),
        })?;
        Ok(Self::restore(schema, state))
    }

    /// Serializes the state to bytes.
    pub fn dump(&self) -> ModelResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.state_ref())?)
    }

    pub fn load(bytes: &[u8]) -> ModelResult<Self> {
        Self::from_state(serde_json::from_slice(bytes)?)
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.state_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let state = EntityState::deserialize(deserializer)?;
        Self::from_state(state).map_err(serde::de::Error::custom)
    }
}
