//! Library side of the `formwork` command.
//!
//! Loads a schema manifest, reads a JSON document into an entity of one of
//! its schemas, applies dotted-path assignments and renders the result.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use formwork_model::{Entity, Manifest, Schema, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// How the resulting entity is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// The entity's JSON form.
    #[default]
    Json,
    /// The entity's plain-data form.
    Flatten,
}

/// Reads a manifest, choosing JSON or TOML by file extension.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Manifest::from_json(&source),
        _ => Manifest::from_toml(&source),
    }
    .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
    debug!("Loaded {} schema declarations", manifest.schema.len());
    Ok(manifest)
}

/// Builds the manifest's schemas and picks the one called `name`.
pub fn select_schema(manifest: &Manifest, name: &str) -> Result<Arc<Schema>> {
    let schemas = manifest.build().context("Failed to build schemas")?;
    match schemas.into_iter().find(|schema| schema.name() == name) {
        Some(schema) => Ok(schema),
        None => bail!("Schema {name:?} is not declared in the manifest"),
    }
}

/// Parses `path=value`. The value is read as JSON, or taken as text when it
/// is not valid JSON.
pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let Some((path, value)) = raw.split_once('=') else {
        bail!("Expected PATH=VALUE, got {raw:?}");
    };
    let path = path.trim();
    if path.is_empty() {
        bail!("Empty path in assignment {raw:?}");
    }
    let value = serde_json::from_str::<serde_json::Value>(value)
        .map_or_else(|_| Value::from(value), Value::from);
    Ok((path.to_string(), value))
}

/// Builds an entity from a JSON document and applies the assignments in order.
///
/// A blank document is an empty entity.
pub fn apply(schema: &Arc<Schema>, document: &str, assignments: &[(String, Value)]) -> Result<Entity> {
    let mut entity = if document.trim().is_empty() {
        schema.instantiate()
    } else {
        schema
            .from_json(document)
            .context("Failed to read the input document")?
    };
    for (path, value) in assignments {
        entity
            .set_path(path, value.clone())
            .with_context(|| format!("Failed to set {path}"))?;
    }
    Ok(entity)
}

/// Renders an entity as JSON text.
pub fn render(entity: &Entity, mode: OutputMode, pretty: bool) -> Result<String> {
    let json = match mode {
        OutputMode::Json => serde_json::Value::Object(entity.jsonify()?),
        OutputMode::Flatten => serde_json::Value::Object(
            entity
                .flatten()
                .iter()
                .map(|(name, value)| (name.clone(), plain_json(value)))
                .collect(),
        ),
    };
    let text = if pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    Ok(text)
}

/// JSON view of flattened data. Unlike jsonify it never fails: bytes become
/// arrays of numbers and everything without a JSON form becomes text.
fn plain_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null | Value::Empty => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map_or_else(|| serde_json::Value::String(f.to_string()), serde_json::Value::Number),
        Value::Bytes(bytes) => serde_json::Value::from(bytes.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(plain_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), plain_json(v)))
                .collect(),
        ),
        Value::Entity(entity) => serde_json::Value::Object(
            entity
                .flatten()
                .iter()
                .map(|(k, v)| (k.clone(), plain_json(v)))
                .collect(),
        ),
        other => serde_json::Value::String(other.to_string()),
    }
}
