//! Provider domain module
//!
//! A provider is an agent that owns and serves tools. Providers come into
//! existence in one of two ways:
//!
//! - **Explicit registration** with [`RegisterProviderRequest`] (id, endpoint
//!   and pubkey required).
//! - **Implicitly**, as a [`Provider::placeholder`] created the first time a
//!   tool names them. The placeholder is upgraded in place when the provider
//!   later registers.
//!
//! Identity and `created_at` never change; every other field is last-write-wins.

pub mod entities;

pub use entities::{
    ANONYMOUS_PROVIDER_ID, Provider, RegisterProviderRequest, resolve_requester,
};
