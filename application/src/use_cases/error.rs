//! Registry error taxonomy
//!
//! Every store or domain failure that leaves the application layer is
//! classified here. Callers branch on the variant or on [`RegistryError::code`],
//! never on message text.

use crate::ports::registry_store::StoreError;
use agent_tools_domain::{DomainError, InvocationStatus};
use thiserror::Error;
use tracing::warn;

/// Errors returned by the registry and invocation use cases
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Validation failed: {0}")]
    Validation(#[from] DomainError),

    #[error("Tool already registered: {name}@{version}")]
    Duplicate { name: String, version: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invocation {id} is already {status}")]
    InvalidTransition { id: String, status: InvocationStatus },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage failure during {operation}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::Validation(_) => "INVALID_SCHEMA",
            RegistryError::Duplicate { .. } => "DUPLICATE_TOOL",
            RegistryError::NotFound(_) => "NOT_FOUND",
            RegistryError::InvalidTransition { .. } => "INVALID_STATE",
            RegistryError::Cancelled => "CANCELLED",
            RegistryError::Store { .. } | RegistryError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::Store { .. } | RegistryError::Internal(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }

    pub(crate) fn not_found(what: &str, id: &str) -> Self {
        RegistryError::NotFound(format!("{} {}", what, id))
    }

    /// Classify a store failure that has no operation-specific meaning
    pub(crate) fn from_store(operation: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::Cancelled => RegistryError::Cancelled,
            StoreError::Corrupt(detail) | StoreError::Serialization(detail) => {
                warn!(operation, %detail, "Stored data could not be decoded");
                RegistryError::Internal(format!("{} read undecodable data", operation))
            }
            source => RegistryError::Store { operation, source },
        }
    }
}
