//! Domain errors definition.

use crate::kind::AbstractValueKind;
use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("internal error: {0}")]
    Internal(String),

    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("undefined operation: {0}")]
    UndefinedOperation(String),

    #[error("invalid abstract value: expected {expected}, got {actual}")]
    InvalidAbstractValue {
        expected: AbstractValueKind,
        actual: AbstractValueKind,
    },
}

impl DomainError {
    pub(crate) fn invalid_argument(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
