//! Deferred resolution of entity type references.
//!
//! Schemas are registered in a process-wide catalog by name. A reference
//! to a name that is only declared (or not known at all) is legal when the
//! field is declared; it must resolve by the time the field is first used.
//! Successful resolutions are cached per exact name string and never
//! re-resolved.

use crate::error::{ModelError, ModelResult};
use crate::schema::Schema;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock, Weak};
use tracing::debug;

/// The marker naming the schema that owns the field.
pub const SELF_REFERENCE: &str = "self";

/// The target of an entity field.
#[derive(Clone)]
pub enum Reference {
    /// A concrete, already built schema.
    Schema(Arc<Schema>),
    /// The schema that declares the field.
    Owner,
    /// A schema name, possibly not defined yet.
    Named(String),
}

impl Reference {
    /// Resolves a concrete or named reference.
    ///
    /// `Owner` can only be resolved through the binding performed when the
    /// owning schema is built.
    pub fn resolve(&self) -> ModelResult<Arc<Schema>> {
        match self {
            Self::Schema(schema) => Ok(Arc::clone(schema)),
            Self::Owner => Err(ModelError::invalid_reference(
                SELF_REFERENCE,
                "not bound to an owning schema",
            )),
            Self::Named(name) => resolve(name),
        }
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(schema) => f.debug_tuple("Schema").field(&schema.name()).finish(),
            Self::Owner => f.write_str("Owner"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl From<Arc<Schema>> for Reference {
    fn from(schema: Arc<Schema>) -> Self {
        Self::Schema(schema)
    }
}

impl From<&Arc<Schema>> for Reference {
    fn from(schema: &Arc<Schema>) -> Self {
        Self::Schema(Arc::clone(schema))
    }
}

impl From<&str> for Reference {
    fn from(name: &str) -> Self {
        if name == SELF_REFERENCE {
            Self::Owner
        } else {
            Self::Named(name.to_string())
        }
    }
}

impl From<String> for Reference {
    fn from(name: String) -> Self {
        if name == SELF_REFERENCE {
            Self::Owner
        } else {
            Self::Named(name)
        }
    }
}

/// A resolved reference as cached by an entity field.
#[derive(Debug, Clone)]
pub(crate) enum ResolvedTarget {
    Strong(Arc<Schema>),
    /// The owning schema. Held weakly so a schema does not own itself.
    Owner(Weak<Schema>),
}

impl ResolvedTarget {
    pub(crate) fn upgrade(&self) -> ModelResult<Arc<Schema>> {
        match self {
            Self::Strong(schema) => Ok(Arc::clone(schema)),
            Self::Owner(weak) => weak
                .upgrade()
                .ok_or_else(|| ModelError::invalid_reference(SELF_REFERENCE, "owning schema dropped")),
        }
    }
}

#[derive(Debug, Clone)]
enum CatalogEntry {
    Declared,
    Defined(Arc<Schema>),
}

static CATALOG: LazyLock<RwLock<HashMap<String, CatalogEntry>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

static RESOLVED: LazyLock<RwLock<HashMap<String, Arc<Schema>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Reserves `name` for a schema that will be built later.
///
/// Declaring a name that is already defined is a no-op.
pub fn declare(name: &str) -> ModelResult<()> {
    if !is_dotted_identifier(name) {
        return Err(ModelError::invalid_reference(name, "not a dotted name"));
    }
    CATALOG
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(name.to_string())
        .or_insert(CatalogEntry::Declared);
    Ok(())
}

/// Registers a built schema under its name, replacing any previous entry.
pub(crate) fn define(schema: &Arc<Schema>) {
    debug!(schema = schema.name(), "Defining schema");
    CATALOG
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(schema.name().to_string(), CatalogEntry::Defined(Arc::clone(schema)));
}

/// The current definition of `name`, if it has been built.
#[must_use]
pub fn lookup(name: &str) -> Option<Arc<Schema>> {
    match CATALOG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
    {
        Some(CatalogEntry::Defined(schema)) => Some(Arc::clone(schema)),
        _ => None,
    }
}

/// Resolves a schema name, caching the result on success.
pub fn resolve(name: &str) -> ModelResult<Arc<Schema>> {
    if let Some(schema) = RESOLVED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
    {
        return Ok(Arc::clone(schema));
    }

    if name == SELF_REFERENCE {
        return Err(ModelError::invalid_reference(
            name,
            "not bound to an owning schema",
        ));
    }
    if !is_dotted_identifier(name) {
        return Err(ModelError::invalid_reference(name, "not a dotted name"));
    }

    let entry = CATALOG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned();
    let schema = match entry {
        Some(CatalogEntry::Defined(schema)) => schema,
        Some(CatalogEntry::Declared) => {
            return Err(ModelError::invalid_reference(name, "declared but not constructible yet"));
        }
        None => return Err(ModelError::invalid_reference(name, "no such schema")),
    };

    debug!(reference = name, "Resolved schema reference");
    let mut resolved = RESOLVED.write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(
        resolved.entry(name.to_string()).or_insert(schema),
    ))
}

pub(crate) fn is_dotted_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_identifiers() {
        assert!(is_dotted_identifier("Person"));
        assert!(is_dotted_identifier("app.models.Person"));
        assert!(is_dotted_identifier("_private.Thing2"));
        assert!(!is_dotted_identifier(""));
        assert!(!is_dotted_identifier("app..Person"));
        assert!(!is_dotted_identifier("app.2nd"));
        assert!(!is_dotted_identifier("app.Person!"));
    }

    #[test]
    fn self_strings_become_owner() {
        assert!(matches!(Reference::from("self"), Reference::Owner));
        assert!(matches!(
            Reference::from(String::from("a.B")),
            Reference::Named(ref n) if n == "a.B"
        ));
    }
}
