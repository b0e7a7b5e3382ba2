//! Registry use case
//!
//! Tool registration, discovery and lifecycle, plus provider registration.
//! Validation happens here before anything reaches the store.

use super::error::RegistryError;
use super::invocation_tracker::InvocationTracker;
use crate::ports::cancellation::Cancellation;
use crate::ports::registry_store::{RegistryStore, StoreError};
use agent_tools_domain::{
    Page, Provider, RegisterProviderRequest, RegisterToolRequest, SearchQuery, SearchResult, Tool,
    ToolFilter, ToolUpdate,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Registry engine over a [`RegistryStore`]
pub struct RegistryService<S: RegistryStore + 'static> {
    store: Arc<S>,
    scope: Cancellation,
}

impl<S: RegistryStore + 'static> Clone for RegistryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            scope: self.scope.clone(),
        }
    }
}

impl<S: RegistryStore + 'static> RegistryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            scope: Cancellation::none(),
        }
    }

    /// Scoped copy whose operations abort once `token` is cancelled
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            store: Arc::clone(&self.store),
            scope: self.scope.clone().with_token(token),
        }
    }

    /// Scoped copy whose operations abort after `deadline`
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            store: Arc::clone(&self.store),
            scope: self.scope.clone().with_deadline(deadline),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Invocation tracker sharing this service's store and scope
    pub fn invocations(&self) -> InvocationTracker<S> {
        InvocationTracker::new(Arc::clone(&self.store), self.scope.clone())
    }

    fn check_cancelled(&self) -> Result<(), RegistryError> {
        if self.scope.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        Ok(())
    }

    // ==================== Tools ====================

    /// Validate and persist a new tool owned by `provider_id`
    ///
    /// The provider is created as a placeholder if unknown. A second
    /// registration of the same active `(name, version, provider)` fails with
    /// [`RegistryError::Duplicate`]; a deactivated one is revived.
    pub async fn register_tool(
        &self,
        provider_id: &str,
        request: RegisterToolRequest,
    ) -> Result<Tool, RegistryError> {
        self.check_cancelled()?;
        let tool = request.into_tool(provider_id, Utc::now())?;

        match self.store.insert_tool(&self.scope, &tool).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation(_)) => {
                debug!(id = %tool.id, "Registration rejected, slot already active");
                return Err(RegistryError::Duplicate {
                    name: tool.name,
                    version: tool.version,
                });
            }
            Err(e) => return Err(self.classify("register tool", e)),
        }

        info!(
            id = %tool.id,
            slot = %tool.slot(),
            provider = %tool.provider_id,
            "Tool registered"
        );

        // The write is committed; read back without the scope so a late
        // cancellation cannot report a committed registration as failed.
        self.store
            .get_tool(&Cancellation::none(), &tool.id)
            .await
            .map_err(|e| self.classify("register tool", e))?
            .ok_or_else(|| {
                RegistryError::Internal(format!("tool {} missing after insert", tool.id))
            })
    }

    /// Fetch a tool by ID, active or not
    pub async fn get_tool(&self, id: &str) -> Result<Tool, RegistryError> {
        self.check_cancelled()?;
        self.store
            .get_tool(&self.scope, id)
            .await
            .map_err(|e| self.classify("get tool", e))?
            .ok_or_else(|| RegistryError::not_found("tool", id))
    }

    /// Browse active tools, newest first
    pub async fn list_tools(&self, page: i64, limit: i64) -> Result<SearchResult, RegistryError> {
        self.query(ToolFilter::default(), Page::clamped(page, limit), None)
            .await
    }

    /// Full-text search over active tools with optional filters
    ///
    /// A blank query degrades to browsing with the same filters.
    pub async fn search_tools(&self, query: &SearchQuery) -> Result<SearchResult, RegistryError> {
        let filter = query.filter();
        // Report the query only when it still searches something
        let label = if filter.is_browse() {
            None
        } else {
            Some(query.query.trim().to_string())
        };
        self.query(filter, query.window(), label).await
    }

    async fn query(
        &self,
        filter: ToolFilter,
        page: Page,
        label: Option<String>,
    ) -> Result<SearchResult, RegistryError> {
        self.check_cancelled()?;
        debug!(?filter, page = page.page, limit = page.limit, "Querying tools");

        let tools = self
            .store
            .list_tools(&self.scope, &filter, page)
            .await
            .map_err(|e| self.classify("list tools", e))?;
        let total = self
            .store
            .count_tools(&self.scope, &filter)
            .await
            .map_err(|e| self.classify("count tools", e))?;

        Ok(SearchResult {
            tools,
            total,
            page: page.page,
            limit: page.limit,
            query: label,
        })
    }

    /// Change the mutable fields of an active tool owned by the requester
    ///
    /// Unknown, inactive and foreign tools all report [`RegistryError::NotFound`].
    pub async fn update_tool(
        &self,
        id: &str,
        requesting_provider_id: &str,
        update: ToolUpdate,
    ) -> Result<Tool, RegistryError> {
        self.check_cancelled()?;
        let update = update.normalize()?;

        let changed = self
            .store
            .update_tool(&self.scope, id, requesting_provider_id, &update, Utc::now())
            .await
            .map_err(|e| self.classify("update tool", e))?;
        if !changed {
            return Err(RegistryError::not_found("tool", id));
        }
        info!(id, provider = requesting_provider_id, "Tool updated");

        self.store
            .get_tool(&Cancellation::none(), id)
            .await
            .map_err(|e| self.classify("update tool", e))?
            .ok_or_else(|| RegistryError::Internal(format!("tool {} missing after update", id)))
    }

    /// Hide a tool from discovery. Only the owning provider may do this.
    ///
    /// Repeating the call on an inactive tool succeeds and leaves it unchanged.
    pub async fn deactivate_tool(
        &self,
        id: &str,
        requesting_provider_id: &str,
    ) -> Result<(), RegistryError> {
        self.check_cancelled()?;
        let changed = self
            .store
            .deactivate_tool(&self.scope, id, requesting_provider_id, Utc::now())
            .await
            .map_err(|e| self.classify("deactivate tool", e))?;
        if !changed {
            return Err(RegistryError::not_found("tool", id));
        }
        info!(id, provider = requesting_provider_id, "Tool deactivated");
        Ok(())
    }

    // ==================== Providers ====================

    /// Create or upgrade a provider record
    pub async fn register_provider(
        &self,
        request: RegisterProviderRequest,
    ) -> Result<Provider, RegistryError> {
        self.check_cancelled()?;
        let provider = request.into_provider(Utc::now())?;

        self.store
            .upsert_provider(&self.scope, &provider)
            .await
            .map_err(|e| self.classify("register provider", e))?;
        info!(id = %provider.id, endpoint = %provider.endpoint, "Provider registered");

        self.store
            .get_provider(&Cancellation::none(), &provider.id)
            .await
            .map_err(|e| self.classify("register provider", e))?
            .ok_or_else(|| {
                RegistryError::Internal(format!("provider {} missing after upsert", provider.id))
            })
    }

    pub async fn get_provider(&self, id: &str) -> Result<Provider, RegistryError> {
        self.check_cancelled()?;
        self.store
            .get_provider(&self.scope, id)
            .await
            .map_err(|e| self.classify("get provider", e))?
            .ok_or_else(|| RegistryError::not_found("provider", id))
    }

    pub async fn list_providers(&self) -> Result<Vec<Provider>, RegistryError> {
        self.check_cancelled()?;
        self.store
            .list_providers(&self.scope)
            .await
            .map_err(|e| self.classify("list providers", e))
    }

    fn classify(&self, operation: &'static str, err: StoreError) -> RegistryError {
        let detail = err.to_string();
        let err = RegistryError::from_store(operation, err);
        if err.is_retryable() {
            warn!(operation, %detail, "Store failure");
        }
        err
    }
}
