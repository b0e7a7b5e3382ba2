//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: validation failures
//! - [`identity`]: tool DID derivation and payload digests
//! - [`decimal`]: decimal-string amounts (stake, price, cost)

pub mod decimal;
pub mod error;
pub mod identity;
