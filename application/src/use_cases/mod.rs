//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod error;
pub mod invocation_tracker;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;
