//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Every variant describes a request the caller has to fix; none of them
/// is worth retrying unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid {which} schema: {reason}")]
    InvalidSchema { which: &'static str, reason: String },

    #[error("invalid pricing: {0}")]
    InvalidPricing(String),

    #[error("invalid decimal amount for {field}: {value:?}")]
    InvalidAmount { field: &'static str, value: String },

    #[error("invalid tag {0:?}: tags must not contain ','")]
    InvalidTag(String),

    #[error("unknown invocation status: {0}")]
    UnknownStatus(String),

    #[error("invocation cannot move from {from} to {to}")]
    IllegalTransition { from: String, to: String },
}

impl DomainError {
    /// Name of the offending request field, when there is a single one
    pub fn field(&self) -> Option<&str> {
        match self {
            DomainError::MissingField(field) => Some(field),
            DomainError::InvalidSchema { .. } => Some("schema"),
            DomainError::InvalidPricing(_) => Some("pricing"),
            DomainError::InvalidAmount { field, .. } => Some(field),
            DomainError::InvalidTag(_) => Some("tags"),
            DomainError::UnknownStatus(_) | DomainError::IllegalTransition { .. } => None,
        }
    }
}
