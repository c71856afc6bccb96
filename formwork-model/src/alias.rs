//! Aliases: non-stored accessors onto a dotted path of real fields.

use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::reference::{self, Reference};
use crate::schema::{FieldMap, Schema};
use crate::value::Value;
use std::sync::Arc;

/// An alias declaration. Holds no value and is never flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasSpec {
    target: String,
    doc: Option<String>,
}

impl AliasSpec {
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            doc: None,
        }
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Reads the target path. Empty intermediates are an error.
    pub fn get(&self, entity: &Entity) -> ModelResult<Value> {
        entity.get_path(&self.target)
    }

    /// Writes the target path, creating intermediate entities.
    pub fn set(&self, entity: &mut Entity, value: impl Into<Value>) -> ModelResult<()> {
        entity.set_path(&self.target, value)
    }

    /// Checks the target against the fields of the schema being built.
    ///
    /// Segments behind a named reference that cannot be resolved yet are
    /// left for the path resolver to check on use.
    pub(crate) fn validate(&self, name: &str, own: &FieldMap) -> ModelResult<()> {
        if self.target.contains('?') {
            return Err(ModelError::invalid_declaration(
                name,
                format!("alias target {:?} cannot soak", self.target),
            ));
        }

        let segments: Vec<&str> = self.target.split('.').collect();
        let mut nested: Option<Arc<Schema>> = None;
        for (depth, segment) in segments.iter().enumerate() {
            let fields = nested.as_ref().map_or(own, |schema| schema.fields());
            let Some(spec) = fields.get(segment) else {
                return Err(ModelError::invalid_declaration(
                    name,
                    format!("alias target {:?} has no field {segment:?}", self.target),
                ));
            };
            if depth + 1 == segments.len() {
                break;
            }
            let Some(entity_field) = spec.field().as_entity_field() else {
                return Err(ModelError::invalid_declaration(
                    name,
                    format!("alias target {:?}: {segment:?} is not an entity field", self.target),
                ));
            };
            nested = match entity_field.reference() {
                // Unbound owner references point at the schema being built.
                Reference::Owner => entity_field.schema().ok(),
                Reference::Schema(schema) => Some(Arc::clone(schema)),
                Reference::Named(target) => match reference::resolve(target) {
                    Ok(schema) => Some(schema),
                    Err(_) => return Ok(()),
                },
            };
        }
        Ok(())
    }
}
