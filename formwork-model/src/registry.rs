//! Process-wide adaptation registries.
//!
//! - Adapters: converters keyed by (field kind, input value type), consulted
//!   at step 4 of adaptation. Seeded with the built-in scalar conversions.
//! - Loose kinds: value type → field kind, used to render values stored on
//!   flexible entities outside their schema.
//! - Fallback: the optional generic `adapt(value, kind)` collaborator.
//!
//! Registration is explicit; nothing here is mutated implicitly.

use crate::error::AdaptError;
use crate::fields::FieldKind;
use crate::value::{Value, ValueType};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

/// Converts one input value into a field kind's canonical value.
pub type Converter = Arc<dyn Fn(&Value) -> Result<Value, AdaptError> + Send + Sync>;

/// The generic adaptation collaborator.
pub type FallbackAdapter = Arc<dyn Fn(&Value, FieldKind) -> Result<Value, AdaptError> + Send + Sync>;

static ADAPTERS: LazyLock<RwLock<HashMap<(FieldKind, ValueType), Converter>>> =
    LazyLock::new(|| RwLock::new(builtin_adapters()));

static LOOSE_KINDS: LazyLock<RwLock<HashMap<ValueType, FieldKind>>> = LazyLock::new(|| {
    RwLock::new(HashMap::from([
        (ValueType::DateTime, FieldKind::DateTime),
        (ValueType::Int, FieldKind::Int),
        (ValueType::Text, FieldKind::String),
        (ValueType::Float, FieldKind::Float),
        (ValueType::Bool, FieldKind::Bool),
    ]))
});

static FALLBACK: RwLock<Option<FallbackAdapter>> = RwLock::new(None);

/// Registers `converter` for adapting `from` values to `kind`.
///
/// Replaces any previous converter for the same pair, built-ins included.
pub fn register_adapter(
    kind: FieldKind,
    from: ValueType,
    converter: impl Fn(&Value) -> Result<Value, AdaptError> + Send + Sync + 'static,
) {
    debug!(%kind, ?from, "Registering field adapter");
    ADAPTERS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert((kind, from), Arc::new(converter));
}

/// Looks up the converter for (`kind`, `from`), falling back to the parent kind.
#[must_use]
pub fn adapter(kind: FieldKind, from: ValueType) -> Option<Converter> {
    let adapters = ADAPTERS.read().unwrap_or_else(PoisonError::into_inner);
    let mut current = Some(kind);
    while let Some(kind) = current {
        if let Some(converter) = adapters.get(&(kind, from)) {
            return Some(Arc::clone(converter));
        }
        current = kind.parent();
    }
    None
}

/// Maps a value type to the field kind used to render it loosely.
pub fn register_kind_for_type(value_type: ValueType, kind: FieldKind) {
    debug!(?value_type, %kind, "Registering loose field kind");
    LOOSE_KINDS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(value_type, kind);
}

#[must_use]
pub fn kind_for_type(value_type: ValueType) -> Option<FieldKind> {
    LOOSE_KINDS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&value_type)
        .copied()
}

/// Installs the generic adapter consulted before adaptation gives up.
pub fn install_fallback(
    adapter: impl Fn(&Value, FieldKind) -> Result<Value, AdaptError> + Send + Sync + 'static,
) {
    debug!("Installing fallback adapter");
    *FALLBACK.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(adapter));
}

pub fn clear_fallback() {
    *FALLBACK.write().unwrap_or_else(PoisonError::into_inner) = None;
}

pub(crate) fn fallback(value: &Value, kind: FieldKind) -> Option<Result<Value, AdaptError>> {
    let fallback = FALLBACK
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()?;
    Some(fallback(value, kind))
}

fn builtin_adapters() -> HashMap<(FieldKind, ValueType), Converter> {
    let mut adapters: HashMap<(FieldKind, ValueType), Converter> = HashMap::new();
    let mut add = |kind, from, converter: fn(&Value) -> Result<Value, AdaptError>| {
        adapters.insert((kind, from), Arc::new(converter));
    };

    add(FieldKind::Int, ValueType::Text, int_from_text);
    add(FieldKind::Int, ValueType::Float, int_from_float);
    add(FieldKind::Int, ValueType::Bool, |v| match v {
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        other => Err(AdaptError::new(other, FieldKind::Int)),
    });

    add(FieldKind::Float, ValueType::Int, |v| match v {
        #[allow(clippy::cast_precision_loss)]
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        other => Err(AdaptError::new(other, FieldKind::Float)),
    });
    add(FieldKind::Float, ValueType::Text, float_from_text);
    add(FieldKind::Float, ValueType::Decimal, |v| match v {
        Value::Decimal(d) => d
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| AdaptError::new(v, FieldKind::Float)),
        other => Err(AdaptError::new(other, FieldKind::Float)),
    });

    add(FieldKind::Bool, ValueType::Text, bool_from_text);
    add(FieldKind::Bool, ValueType::Int, |v| match v {
        Value::Int(1) => Ok(Value::Bool(true)),
        Value::Int(0) => Ok(Value::Bool(false)),
        other => Err(AdaptError::new(other, FieldKind::Bool)),
    });
    add(FieldKind::Bool, ValueType::Float, |v| match v {
        Value::Float(f) if *f == 1.0 => Ok(Value::Bool(true)),
        Value::Float(f) if *f == 0.0 => Ok(Value::Bool(false)),
        other => Err(AdaptError::new(other, FieldKind::Bool)),
    });

    add(FieldKind::DateTime, ValueType::Text, |v| match v {
        Value::Text(text) => formwork_types::parse_date(text)
            .map(Value::DateTime)
            .map_err(|e| AdaptError::new(v, FieldKind::DateTime).because(e)),
        other => Err(AdaptError::new(other, FieldKind::DateTime)),
    });

    adapters
}

fn int_from_text(value: &Value) -> Result<Value, AdaptError> {
    match value {
        Value::Text(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| AdaptError::new(value, FieldKind::Int).because(e)),
        other => Err(AdaptError::new(other, FieldKind::Int)),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn int_from_float(value: &Value) -> Result<Value, AdaptError> {
    match value {
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Ok(Value::Int(*f as i64))
        }
        other => Err(AdaptError::new(other, FieldKind::Int).because("fractional or out of range")),
    }
}

fn float_from_text(value: &Value) -> Result<Value, AdaptError> {
    match value {
        Value::Text(text) => text
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| AdaptError::new(value, FieldKind::Float).because(e)),
        other => Err(AdaptError::new(other, FieldKind::Float)),
    }
}

fn bool_from_text(value: &Value) -> Result<Value, AdaptError> {
    let Value::Text(text) = value else {
        return Err(AdaptError::new(value, FieldKind::Bool));
    };
    match text.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Ok(Value::Bool(true)),
        "no" | "false" | "0" | "off" => Ok(Value::Bool(false)),
        _ => Err(AdaptError::new(value, FieldKind::Bool)),
    }
}
