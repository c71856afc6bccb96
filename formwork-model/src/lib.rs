//! Declarative entity schemas for formwork.
//!
//! A [`Schema`] declares typed, named fields; an [`Entity`] holds values
//! adapted to those fields and converts them to plain data and JSON:
//! - [`Value`]: the dynamic value model, with the [`CustomValue`] capability
//! - [`Field`] / [`FieldSpec`]: field kinds and their adapt/flatten/jsonify contract
//! - [`SchemaBuilder`]: collects fields, aliases and bases into an immutable schema
//! - [`Entity`]: value store, change tracking and dot-notation paths
//! - [`reference`]: the schema catalog and lazy by-name references
//! - [`registry`]: process-wide adapter, loose-kind and fallback registries
//! - [`Manifest`]: schemas declared as TOML or JSON data
//!
//! Nothing here performs I/O. The only shared state is the catalog and the
//! registries; both are guarded and safe to use from any thread.

mod alias;
mod entity;
mod error;
mod fields;
mod manifest;
mod path;
pub mod reference;
pub mod registry;
mod schema;
mod state;
mod value;

pub use alias::AliasSpec;
pub use entity::Entity;
pub use error::{AdaptError, ModelError, ModelResult};
pub use fields::{
    BoolField, BytesField, CollectionField, DateTimeField, DefaultFactory, DefaultValue,
    EmailField, EntityField, Field, FieldKind, FieldSpec, FloatField, IdField, IntField,
    SlugField, StringField, UrlField,
};
pub use manifest::{AliasDecl, FieldDecl, Manifest, SchemaDecl};
pub use reference::Reference;
pub use schema::{Declaration, FieldMap, Schema, SchemaAdapter, SchemaBuilder};
pub use state::EntityState;
pub use value::{CustomValue, Value, ValueType};

pub use formwork_types::Encoding;
