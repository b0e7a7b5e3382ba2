//! Registry store port
//!
//! Defines the persistence interface for tools, providers and invocations.
//! The SQLite adapter lives in the infrastructure layer.

use super::cancellation::Cancellation;
use agent_tools_domain::{
    Invocation, InvocationId, InvocationOutcome, InvocationStatus, Page, Provider, Tool,
    ToolFilter, ToolUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by store adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to open store at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Connection unavailable: {0}")]
    Connection(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a guarded `pending -> terminal` update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    Applied,
    /// No invocation with that ID
    Missing,
    /// The invocation already left `pending`
    AlreadyTerminal(InvocationStatus),
}

/// Durable storage for the registry
///
/// Each write method is atomic: it either commits fully or leaves no trace.
/// Implementations check `scope` before starting and again before commit.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Ensure the owning provider exists (placeholder if new, `last_seen`
    /// refreshed otherwise) and insert the tool, in one transaction.
    ///
    /// An inactive row with the same ID is revived in place. An active one
    /// yields [`StoreError::UniqueViolation`].
    async fn insert_tool(&self, scope: &Cancellation, tool: &Tool) -> StoreResult<()>;

    /// Fetch a tool by ID regardless of its active flag
    async fn get_tool(&self, scope: &Cancellation, id: &str) -> StoreResult<Option<Tool>>;

    /// Active tools matching `filter`, one page
    async fn list_tools(
        &self,
        scope: &Cancellation,
        filter: &ToolFilter,
        page: Page,
    ) -> StoreResult<Vec<Tool>>;

    /// Number of active tools matching `filter`
    async fn count_tools(&self, scope: &Cancellation, filter: &ToolFilter) -> StoreResult<u64>;

    /// Apply `update` to an active tool owned by `owner`.
    /// Returns `false` if no such tool exists.
    async fn update_tool(
        &self,
        scope: &Cancellation,
        id: &str,
        owner: &str,
        update: &ToolUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Clear the active flag of a tool owned by `owner`.
    /// Returns `false` if nothing changed.
    async fn deactivate_tool(
        &self,
        scope: &Cancellation,
        id: &str,
        owner: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    async fn upsert_provider(&self, scope: &Cancellation, provider: &Provider) -> StoreResult<()>;

    async fn get_provider(&self, scope: &Cancellation, id: &str) -> StoreResult<Option<Provider>>;

    async fn list_providers(&self, scope: &Cancellation) -> StoreResult<Vec<Provider>>;

    /// Insert a pending invocation. A missing tool yields
    /// [`StoreError::ForeignKeyViolation`].
    async fn insert_invocation(
        &self,
        scope: &Cancellation,
        invocation: &Invocation,
    ) -> StoreResult<()>;

    async fn get_invocation(
        &self,
        scope: &Cancellation,
        id: &InvocationId,
    ) -> StoreResult<Option<Invocation>>;

    /// Invocations of one tool, newest first
    async fn list_invocations(
        &self,
        scope: &Cancellation,
        tool_id: &str,
    ) -> StoreResult<Vec<Invocation>>;

    /// Move a pending invocation to the outcome's terminal state
    async fn finish_invocation(
        &self,
        scope: &Cancellation,
        id: &InvocationId,
        outcome: &InvocationOutcome,
        at: DateTime<Utc>,
    ) -> StoreResult<TransitionResult>;
}
