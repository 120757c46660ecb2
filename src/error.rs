use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid attribute path: {0}")]
    InvalidPath(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("unknown attribute '{attribute}' on {kind}")]
    UnknownAttribute { kind: String, attribute: String },

    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("attribute '{0}' is not a relation")]
    NotARelation(String),

    #[error("permission already registered: {0}")]
    DuplicatePermission(String),

    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    #[error("Poisoned lock error: {0}")]
    PoisonedLockError(String),

    #[error("repository error: {0}")]
    RepositoryError(String),
}

impl RuleError {
    pub(crate) fn unknown_attribute(kind: impl Into<String>, attribute: impl Into<String>) -> Self {
        RuleError::UnknownAttribute {
            kind: kind.into(),
            attribute: attribute.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for RuleError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        RuleError::PoisonedLockError(err.to_string())
    }
}
