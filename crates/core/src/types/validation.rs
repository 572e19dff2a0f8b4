//! Errors raised when converting wire payloads into domain records.

use thiserror::Error;

/// A backend payload did not satisfy the domain's invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was absent or null.
    #[error("{record}: missing field `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    /// A field was present but held an unusable value.
    #[error("{record}: invalid `{field}`: {reason}")]
    InvalidField {
        record: &'static str,
        field: &'static str,
        reason: String,
    },
}

impl ValidationError {
    pub(crate) const fn missing(record: &'static str, field: &'static str) -> Self {
        Self::MissingField { record, field }
    }

    pub(crate) fn invalid(
        record: &'static str,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            record,
            field,
            reason: reason.into(),
        }
    }
}

/// Unwrap a required payload field.
pub(crate) fn require<T>(
    value: Option<T>,
    record: &'static str,
    field: &'static str,
) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::missing(record, field))
}
