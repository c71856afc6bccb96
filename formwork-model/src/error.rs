//! Error types for the entity model.

use crate::fields::FieldKind;
use crate::value::Value;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while declaring schemas or working with entities.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Attribute write of a name the (strict) schema does not declare.
    #[error("field {field:?} is not declared on {schema}")]
    UndeclaredField { schema: String, field: String },

    /// A dotted-path segment that the relevant schema does not declare.
    #[error("unknown field {path:?}")]
    UnknownField { path: String },

    /// A non-soaking path segment walked into an empty nested entity.
    #[error("{path} is empty")]
    EmptyIntermediate { path: String },

    /// A non-terminal path segment that is not an entity reference field.
    #[error("expected an entity field at {path:?}")]
    NotAnEntityField { path: String },

    /// A value could not be coerced to a field's canonical type.
    #[error(transparent)]
    Adaptation(#[from] AdaptError),

    /// An entity reference could not be resolved to a constructible schema.
    #[error("invalid reference {name:?}: {reason}")]
    InvalidReference { name: String, reason: String },

    /// A schema declaration that cannot be turned into a field or alias.
    #[error("invalid declaration for {name:?}: {reason}")]
    InvalidDeclaration { name: String, reason: String },

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A TOML schema manifest could not be parsed.
    #[error("manifest error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ModelError {
    pub(crate) fn invalid_reference(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_declaration(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// A value that could not be adapted to a field kind.
///
/// Carries a rendering of the offending value and the name of the target so
/// the message is useful without the original input at hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not adapt {value} to {target}{}", reason_suffix(.reason))]
pub struct AdaptError {
    pub value: String,
    pub target: String,
    pub reason: Option<String>,
}

impl AdaptError {
    /// Creates an error for `value` that could not become `kind`.
    #[must_use]
    pub fn new(value: &Value, kind: FieldKind) -> Self {
        Self::to_target(value, kind.to_string())
    }

    /// Creates an error naming an arbitrary target (e.g. a schema name).
    #[must_use]
    pub fn to_target(value: &Value, target: impl Into<String>) -> Self {
        Self {
            value: format!("{value:?}"),
            target: target.into(),
            reason: None,
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn because(mut self, reason: impl ToString) -> Self {
        self.reason = Some(reason.to_string());
        self
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(": {r}"))
        .unwrap_or_default()
}
