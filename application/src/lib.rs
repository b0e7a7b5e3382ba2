//! Application layer for agent-tools
//!
//! This crate contains the registry use cases and the storage port they
//! drive. It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    cancellation::Cancellation,
    registry_store::{RegistryStore, StoreError, StoreResult, TransitionResult},
};
pub use use_cases::error::RegistryError;
pub use use_cases::invocation_tracker::InvocationTracker;
pub use use_cases::registry::RegistryService;
