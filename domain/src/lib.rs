//! Domain layer for agent-tools
//!
//! This crate contains the entities, value objects and invariants of the tool
//! registry. It has no dependencies on storage or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Tool**: a versioned, schema-described capability. Its ID is derived
//!   from `(name, version, provider_id)`, so a retried registration maps to
//!   the same identity.
//! - **Provider**: the agent that owns tools. Created lazily the first time a
//!   tool references it, upgraded when it registers itself.
//! - **Invocation**: an audit record tracked through
//!   `pending → completed | failed | timeout`.

pub mod core;
pub mod invocation;
pub mod provider;
pub mod tool;

// Re-export commonly used types
pub use crate::core::{
    decimal::is_decimal,
    error::DomainError,
    identity::{payload_digest, tool_did},
};
pub use invocation::{Invocation, InvocationId, InvocationOutcome, InvocationStatus};
pub use provider::{ANONYMOUS_PROVIDER_ID, Provider, RegisterProviderRequest, resolve_requester};
pub use tool::{
    DEFAULT_TIMEOUT_MS, Page, Pricing, PricingModel, RegisterToolRequest, SearchQuery,
    SearchResult, Tool, ToolFilter, ToolSchema, ToolUpdate, search_terms,
};
