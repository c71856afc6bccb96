//! Dot-notation paths into nested entities.
//!
//! `child.pos.top` walks entity fields left to right. A segment suffixed
//! with `?` soaks: reading through it when its entity is empty yields
//! [`Value::Empty`] instead of failing. Writes ignore soak markers and
//! create missing intermediate entities.
//!
//! The whole path is checked against the schemas before any value is
//! touched, so an unknown segment is reported even behind an empty entity.

use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::schema::Schema;
use crate::value::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment<'a> {
    name: &'a str,
    soak: bool,
}

fn parse(path: &str) -> Vec<Segment<'_>> {
    path.split('.')
        .map(|raw| match raw.strip_suffix('?') {
            Some(name) => Segment { name, soak: true },
            None => Segment { name: raw, soak: false },
        })
        .collect()
}

/// The dotted key of the first `depth + 1` segments, without soak markers.
fn key_at(segments: &[Segment<'_>], depth: usize) -> String {
    segments[..=depth]
        .iter()
        .map(|s| s.name)
        .collect::<Vec<_>>()
        .join(".")
}

/// Checks every segment: non-terminals must be entity fields, the terminal
/// a declared field.
fn check(schema: &Arc<Schema>, segments: &[Segment<'_>]) -> ModelResult<()> {
    let mut schema = Arc::clone(schema);
    for (depth, segment) in segments.iter().enumerate() {
        let Some(spec) = schema.field(segment.name) else {
            return Err(ModelError::UnknownField {
                path: key_at(segments, depth),
            });
        };
        if depth + 1 == segments.len() {
            break;
        }
        let Some(entity_field) = spec.field().as_entity_field() else {
            return Err(ModelError::NotAnEntityField {
                path: key_at(segments, depth),
            });
        };
        schema = entity_field.schema()?;
    }
    Ok(())
}

/// Maps an undeclared single-name access to the path error.
fn as_unknown(err: ModelError, path: &str) -> ModelError {
    match err {
        ModelError::UndeclaredField { .. } => ModelError::UnknownField {
            path: path.to_string(),
        },
        other => other,
    }
}

pub(crate) fn get(entity: &Entity, path: &str) -> ModelResult<Value> {
    let segments = parse(path);
    if let [single] = segments.as_slice() {
        return entity.get(single.name).map_err(|e| as_unknown(e, path));
    }
    check(entity.schema(), &segments)?;
    read(entity, &segments, 0)
}

fn read(entity: &Entity, segments: &[Segment<'_>], depth: usize) -> ModelResult<Value> {
    let segment = segments[depth];
    if depth + 1 == segments.len() {
        return entity.get(segment.name);
    }
    match entity.read_declared(segment.name)?.as_ref() {
        Value::Entity(child) => read(child, segments, depth + 1),
        _ if segment.soak => Ok(Value::Empty),
        _ => Err(ModelError::EmptyIntermediate {
            path: key_at(segments, depth),
        }),
    }
}

pub(crate) fn set(entity: &mut Entity, path: &str, value: Value) -> ModelResult<()> {
    let segments = parse(path);
    if let [single] = segments.as_slice() {
        return entity
            .set(single.name, value)
            .map_err(|e| as_unknown(e, path));
    }
    check(entity.schema(), &segments)?;
    write(entity, &segments, 0, value)
}

fn write(entity: &mut Entity, segments: &[Segment<'_>], depth: usize, value: Value) -> ModelResult<()> {
    let segment = segments[depth];
    if depth + 1 == segments.len() {
        return entity.set(segment.name, value);
    }

    if entity.entity(segment.name).is_none() {
        // A default entity is materialized so the write is not lost.
        let child = match entity.read_declared(segment.name)?.into_owned() {
            Value::Entity(child) => child,
            _ => nested_schema(entity.schema(), segment.name)?.instantiate(),
        };
        entity.set(segment.name, Value::Entity(child))?;
    }

    match entity.entity_mut(segment.name) {
        Some(child) => write(child, segments, depth + 1, value),
        None => Err(ModelError::NotAnEntityField {
            path: key_at(segments, depth),
        }),
    }
}

fn nested_schema(schema: &Schema, name: &str) -> ModelResult<Arc<Schema>> {
    schema
        .field(name)
        .and_then(|spec| spec.field().as_entity_field())
        .ok_or_else(|| ModelError::NotAnEntityField {
            path: name.to_string(),
        })?
        .schema()
}
