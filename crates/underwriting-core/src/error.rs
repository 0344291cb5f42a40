use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnderwritingError {
    #[error("Invalid input: {field} = {value}: {reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Numeric fault in {context}")]
    Numeric { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl UnderwritingError {
    /// Build a validation error for `field`, recording the offending value.
    pub fn validation(field: &str, value: impl Display, reason: impl Into<String>) -> Self {
        UnderwritingError::Validation {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn numeric(context: impl Into<String>) -> Self {
        UnderwritingError::Numeric {
            context: context.into(),
        }
    }

    /// Client-side failures; everything else is an internal fault.
    pub fn is_validation(&self) -> bool {
        matches!(self, UnderwritingError::Validation { .. })
    }

    /// Name of the offending field for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            UnderwritingError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for UnderwritingError {
    fn from(e: serde_json::Error) -> Self {
        UnderwritingError::SerializationError(e.to_string())
    }
}
