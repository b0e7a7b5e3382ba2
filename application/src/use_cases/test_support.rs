//! In-memory store used by the use case tests

use crate::ports::cancellation::Cancellation;
use crate::ports::registry_store::{RegistryStore, StoreError, StoreResult, TransitionResult};
use agent_tools_domain::{
    Invocation, InvocationId, InvocationOutcome, Page, Provider, Tool, ToolFilter, ToolUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeStore {
    pub tools: Mutex<Vec<Tool>>,
    pub providers: Mutex<Vec<Provider>>,
    pub invocations: Mutex<Vec<Invocation>>,
    pub calls: Mutex<Vec<&'static str>>,
    fail_next: Mutex<Option<StoreError>>,
}

impl FakeStore {
    pub fn fail_next(&self, err: StoreError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, scope: &Cancellation, call: &'static str) -> StoreResult<()> {
        self.calls.lock().unwrap().push(call);
        scope.check()?;
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn matches(tool: &Tool, filter: &ToolFilter) -> bool {
        tool.is_active
            && filter.tag.as_deref().is_none_or(|t| tool.has_tag(t))
            && filter
                .provider_id
                .as_deref()
                .is_none_or(|p| tool.provider_id == p)
            && filter.text.as_deref().is_none_or(|q| {
                tool.name.contains(q) || tool.description.contains(q)
            })
    }
}

#[async_trait]
impl RegistryStore for FakeStore {
    async fn insert_tool(&self, scope: &Cancellation, tool: &Tool) -> StoreResult<()> {
        self.enter(scope, "insert_tool")?;
        let mut tools = self.tools.lock().unwrap();
        match tools.iter_mut().find(|t| t.id == tool.id) {
            Some(existing) if existing.is_active => {
                return Err(StoreError::UniqueViolation(tool.id.clone()));
            }
            Some(existing) => *existing = tool.clone(),
            None => tools.push(tool.clone()),
        }
        let mut providers = self.providers.lock().unwrap();
        if !providers.iter().any(|p| p.id == tool.provider_id) {
            providers.push(Provider::placeholder(&tool.provider_id, tool.created_at));
        }
        Ok(())
    }

    async fn get_tool(&self, scope: &Cancellation, id: &str) -> StoreResult<Option<Tool>> {
        self.enter(scope, "get_tool")?;
        Ok(self.tools.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn list_tools(
        &self,
        scope: &Cancellation,
        filter: &ToolFilter,
        page: Page,
    ) -> StoreResult<Vec<Tool>> {
        self.enter(scope, "list_tools")?;
        Ok(self
            .tools
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|t| Self::matches(t, filter))
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn count_tools(&self, scope: &Cancellation, filter: &ToolFilter) -> StoreResult<u64> {
        self.enter(scope, "count_tools")?;
        Ok(self
            .tools
            .lock()
            .unwrap()
            .iter()
            .filter(|t| Self::matches(t, filter))
            .count() as u64)
    }

    async fn update_tool(
        &self,
        scope: &Cancellation,
        id: &str,
        owner: &str,
        update: &ToolUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.enter(scope, "update_tool")?;
        let mut tools = self.tools.lock().unwrap();
        let Some(tool) = tools
            .iter_mut()
            .find(|t| t.id == id && t.provider_id == owner && t.is_active)
        else {
            return Ok(false);
        };
        if let Some(description) = &update.description {
            tool.description = description.clone();
        }
        if let Some(pricing) = &update.pricing {
            tool.pricing = pricing.clone();
        }
        if let Some(endpoint) = &update.endpoint {
            tool.endpoint = endpoint.clone();
        }
        if let Some(timeout_ms) = update.timeout_ms {
            tool.timeout_ms = timeout_ms;
        }
        if let Some(tags) = &update.tags {
            tool.tags = tags.clone();
        }
        tool.updated_at = at;
        Ok(true)
    }

    async fn deactivate_tool(
        &self,
        scope: &Cancellation,
        id: &str,
        owner: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.enter(scope, "deactivate_tool")?;
        let mut tools = self.tools.lock().unwrap();
        match tools
            .iter_mut()
            .find(|t| t.id == id && t.provider_id == owner)
        {
            Some(tool) => {
                if tool.is_active {
                    tool.is_active = false;
                    tool.updated_at = at;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert_provider(&self, scope: &Cancellation, provider: &Provider) -> StoreResult<()> {
        self.enter(scope, "upsert_provider")?;
        let mut providers = self.providers.lock().unwrap();
        providers.retain(|p| p.id != provider.id);
        providers.push(provider.clone());
        Ok(())
    }

    async fn get_provider(&self, scope: &Cancellation, id: &str) -> StoreResult<Option<Provider>> {
        self.enter(scope, "get_provider")?;
        Ok(self
            .providers
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_providers(&self, scope: &Cancellation) -> StoreResult<Vec<Provider>> {
        self.enter(scope, "list_providers")?;
        Ok(self.providers.lock().unwrap().clone())
    }

    async fn insert_invocation(
        &self,
        scope: &Cancellation,
        invocation: &Invocation,
    ) -> StoreResult<()> {
        self.enter(scope, "insert_invocation")?;
        if !self
            .tools
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.id == invocation.tool_id)
        {
            return Err(StoreError::ForeignKeyViolation(invocation.tool_id.clone()));
        }
        self.invocations.lock().unwrap().push(invocation.clone());
        Ok(())
    }

    async fn get_invocation(
        &self,
        scope: &Cancellation,
        id: &InvocationId,
    ) -> StoreResult<Option<Invocation>> {
        self.enter(scope, "get_invocation")?;
        Ok(self
            .invocations
            .lock()
            .unwrap()
            .iter()
            .find(|i| &i.id == id)
            .cloned())
    }

    async fn list_invocations(
        &self,
        scope: &Cancellation,
        tool_id: &str,
    ) -> StoreResult<Vec<Invocation>> {
        self.enter(scope, "list_invocations")?;
        Ok(self
            .invocations
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|i| i.tool_id == tool_id)
            .cloned()
            .collect())
    }

    async fn finish_invocation(
        &self,
        scope: &Cancellation,
        id: &InvocationId,
        outcome: &InvocationOutcome,
        at: DateTime<Utc>,
    ) -> StoreResult<TransitionResult> {
        self.enter(scope, "finish_invocation")?;
        let mut invocations = self.invocations.lock().unwrap();
        let Some(invocation) = invocations.iter_mut().find(|i| &i.id == id) else {
            return Ok(TransitionResult::Missing);
        };
        if invocation.status.is_terminal() {
            return Ok(TransitionResult::AlreadyTerminal(invocation.status));
        }
        invocation
            .apply(outcome.clone(), at)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(TransitionResult::Applied)
    }
}
