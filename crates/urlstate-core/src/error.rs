use thiserror::Error;

/// Why a raw value could not be turned back into a typed value.
///
/// Never escapes `BoundSlot::get`; the slot's fallback swallows it and
/// answers with the default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("raw value is empty")]
    Empty,
    #[error("expected {expected} fields, found {found}")]
    Arity { expected: usize, found: usize },
    #[error("field `{field}`: {reason}")]
    Field { field: &'static str, reason: String },
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("{0}")]
    Invalid(String),
}

impl DecodeError {
    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        DecodeError::Field {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Json(e.to_string())
    }
}

/// `ModeSwitch::switch_to` was handed a discriminator nobody registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no codec registered for `{discriminator}` (known: {})", known.join(", "))]
pub struct UnknownCodecError {
    pub discriminator: String,
    pub known: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("empty parameter name in pair {index}")]
    EmptyKey { index: usize },
}
