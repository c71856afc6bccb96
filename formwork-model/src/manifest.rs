//! Schema manifests: schemas declared as TOML or JSON data.

use crate::error::{ModelError, ModelResult};
use crate::fields::{FieldKind, FieldSpec};
use crate::reference;
use crate::schema::{Schema, SchemaBuilder};
use crate::value::Value;
use formwork_types::Encoding;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A set of schema declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub schema: Vec<SchemaDecl>,
}

/// One schema in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDecl {
    /// Catalog name (e.g., "app.Person").
    pub name: String,
    pub doc: Option<String>,
    #[serde(default)]
    pub flexible: bool,
    /// Names of already defined schemas to inherit from, in merge order.
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub field: Vec<FieldDecl>,
    #[serde(default)]
    pub alias: Vec<AliasDecl>,
}

/// One field of a [`SchemaDecl`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub kind: FieldKind,
    /// Entity reference: a schema name or "self".
    pub target: Option<String>,
    /// Element kind of a collection.
    pub of: Option<FieldKind>,
    /// Text encoding of a bytes field (or of bytes collection elements).
    pub encoding: Option<Encoding>,
    /// Literal default, adapted when the schema is built.
    pub default: Option<serde_json::Value>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasDecl {
    pub name: String,
    /// Dotted path of the aliased field.
    pub target: String,
    pub doc: Option<String>,
}

impl Manifest {
    pub fn from_toml(source: &str) -> ModelResult<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_json(source: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Builds every schema in order.
    ///
    /// All names are declared up front, so fields may reference any schema
    /// of the manifest regardless of order. Bases must be built earlier.
    pub fn build(&self) -> ModelResult<Vec<Arc<Schema>>> {
        for decl in &self.schema {
            reference::declare(&decl.name)?;
        }
        self.schema.iter().map(SchemaDecl::build).collect()
    }
}

impl SchemaDecl {
    pub fn build(&self) -> ModelResult<Arc<Schema>> {
        let mut builder: SchemaBuilder = Schema::builder(&self.name);
        if let Some(doc) = &self.doc {
            builder = builder.doc(doc);
        }
        if self.flexible {
            builder = builder.flexible();
        }
        for base in &self.extends {
            let schema = reference::lookup(base).ok_or_else(|| ModelError::InvalidReference {
                name: base.clone(),
                reason: format!("base of {} is not defined", self.name),
            })?;
            builder = builder.extends(&schema);
        }
        for field in &self.field {
            builder = builder.field(&field.name, field.to_spec()?);
        }
        for alias in &self.alias {
            let mut spec = crate::alias::AliasSpec::new(&alias.target);
            if let Some(doc) = &alias.doc {
                spec = spec.with_doc(doc);
            }
            builder = builder.field(&alias.name, spec);
        }
        builder.build()
    }
}

impl FieldDecl {
    pub fn to_spec(&self) -> ModelResult<FieldSpec> {
        let mut spec = match self.kind {
            FieldKind::Collection => {
                let of = self.of.ok_or_else(|| {
                    ModelError::invalid_declaration(&self.name, "collections need `of`")
                })?;
                FieldSpec::collection(self.single_spec(of)?)
            }
            kind => self.single_spec(kind)?,
        };
        if let Some(default) = &self.default {
            spec = spec.with_default(Value::from(default.clone()))?;
        }
        if let Some(doc) = &self.doc {
            spec = spec.with_doc(doc);
        }
        Ok(spec)
    }

    fn single_spec(&self, kind: FieldKind) -> ModelResult<FieldSpec> {
        match kind {
            FieldKind::Entity => {
                let target = self.target.as_deref().ok_or_else(|| {
                    ModelError::invalid_declaration(&self.name, "entity fields need `target`")
                })?;
                Ok(FieldSpec::entity(target))
            }
            FieldKind::Bytes => Ok(FieldSpec::bytes(self.encoding.unwrap_or_default())),
            FieldKind::Collection => Err(ModelError::invalid_declaration(
                &self.name,
                "collections of collections are not supported",
            )),
            other => other.default_field().map(FieldSpec::from_arc).ok_or_else(|| {
                ModelError::invalid_declaration(&self.name, format!("{other} needs a target"))
            }),
        }
    }
}
