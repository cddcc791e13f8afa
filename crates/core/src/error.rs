//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Keep this focused on deterministic input/domain failures (missing fields, malformed
/// identifiers, unknown enum values). Storage concerns belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more required parameters were absent.
    #[error("missing required parameter(s): {0}")]
    MissingParameters(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A value was not one of the allowed enumeration members.
    #[error("invalid value for {field}: {value}")]
    InvalidEnum { field: &'static str, value: String },
}

impl DomainError {
    pub fn missing(fields: &[&str]) -> Self {
        Self::MissingParameters(fields.join(", "))
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_enum(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidEnum {
            field,
            value: value.into(),
        }
    }
}
