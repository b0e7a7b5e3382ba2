//! Tool domain module
//!
//! A **tool** is a versioned, schema-described capability offered by a
//! provider. This module holds the pure parts of the tool lifecycle:
//!
//! ```text
//! RegisterToolRequest ──into_tool()──▶ Tool ──(store)──▶ SearchResult
//!   validate + defaults                 id = tool_did(name, version, provider)
//! ```
//!
//! # Invariants
//!
//! - `(name, version, provider_id)` identifies a tool; the ID is derived from
//!   it with [`tool_did`](crate::core::identity::tool_did), so it is stable
//!   across retries.
//! - Non-positive `timeout_ms` is coerced to [`DEFAULT_TIMEOUT_MS`].
//! - Missing pricing means [`PricingModel::Free`].
//! - `name`, `version` and `schema` never change after registration;
//!   [`ToolUpdate`] only covers the mutable fields.
//!
//! Uniqueness among *active* tools is enforced by the store, not here.

pub mod entities;
pub mod search;
pub mod value_objects;

pub use entities::{DEFAULT_TIMEOUT_MS, RegisterToolRequest, Tool, ToolUpdate};
pub use search::{Page, SearchQuery, SearchResult, ToolFilter, search_terms};
pub use value_objects::{Pricing, PricingModel, ToolSchema};
