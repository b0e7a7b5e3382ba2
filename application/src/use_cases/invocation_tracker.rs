//! Invocation tracker use case
//!
//! Records attempts to call a tool and moves them from `pending` to a
//! terminal state exactly once.

use super::error::RegistryError;
use crate::ports::cancellation::Cancellation;
use crate::ports::registry_store::{RegistryStore, StoreError, TransitionResult};
use agent_tools_domain::{Invocation, InvocationId, InvocationOutcome, resolve_requester};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Audit log of tool invocations
pub struct InvocationTracker<S: RegistryStore + 'static> {
    store: Arc<S>,
    scope: Cancellation,
}

impl<S: RegistryStore + 'static> InvocationTracker<S> {
    pub fn new(store: Arc<S>, scope: Cancellation) -> Self {
        Self { store, scope }
    }

    fn check_cancelled(&self) -> Result<(), RegistryError> {
        if self.scope.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        Ok(())
    }

    /// Store a pending invocation and return its generated ID
    ///
    /// Only the digest of `input` is persisted. A blank consumer is recorded
    /// as the anonymous agent.
    pub async fn record_invocation(
        &self,
        tool_id: &str,
        consumer_id: &str,
        input: &Value,
    ) -> Result<InvocationId, RegistryError> {
        self.check_cancelled()?;
        let consumer = resolve_requester(Some(consumer_id));
        let invocation = Invocation::pending(tool_id.trim(), consumer, input, Utc::now())?;

        match self.store.insert_invocation(&self.scope, &invocation).await {
            Ok(()) => {}
            Err(StoreError::ForeignKeyViolation(_)) => {
                return Err(RegistryError::not_found("tool", tool_id));
            }
            Err(e) => return Err(RegistryError::from_store("record invocation", e)),
        }

        info!(
            id = %invocation.id,
            tool = %invocation.tool_id,
            consumer = %invocation.consumer_id,
            "Invocation recorded"
        );
        Ok(invocation.id)
    }

    pub async fn complete_invocation(
        &self,
        id: &InvocationId,
        output_hash: &str,
        receipt_sig: &str,
        cost_claw: &str,
    ) -> Result<(), RegistryError> {
        self.finish(
            id,
            InvocationOutcome::completed(output_hash.trim(), receipt_sig, cost_claw.trim()),
        )
        .await
    }

    pub async fn fail_invocation(
        &self,
        id: &InvocationId,
        reason: &str,
    ) -> Result<(), RegistryError> {
        self.finish(id, InvocationOutcome::failed(reason)).await
    }

    pub async fn timeout_invocation(&self, id: &InvocationId) -> Result<(), RegistryError> {
        self.finish(id, InvocationOutcome::TimedOut).await
    }

    async fn finish(
        &self,
        id: &InvocationId,
        outcome: InvocationOutcome,
    ) -> Result<(), RegistryError> {
        self.check_cancelled()?;
        outcome.validate()?;

        let result = self
            .store
            .finish_invocation(&self.scope, id, &outcome, Utc::now())
            .await
            .map_err(|e| RegistryError::from_store("finish invocation", e))?;

        match result {
            TransitionResult::Applied => {
                info!(id = %id, status = %outcome.status(), "Invocation finished");
                Ok(())
            }
            TransitionResult::Missing => Err(RegistryError::not_found("invocation", id.as_str())),
            TransitionResult::AlreadyTerminal(status) => {
                warn!(
                    id = %id,
                    %status,
                    attempted = %outcome.status(),
                    "Invocation already finished"
                );
                Err(RegistryError::InvalidTransition {
                    id: id.to_string(),
                    status,
                })
            }
        }
    }

    pub async fn get_invocation(&self, id: &InvocationId) -> Result<Invocation, RegistryError> {
        self.check_cancelled()?;
        self.store
            .get_invocation(&self.scope, id)
            .await
            .map_err(|e| RegistryError::from_store("get invocation", e))?
            .ok_or_else(|| RegistryError::not_found("invocation", id.as_str()))
    }

    /// Invocations of a tool, newest first
    pub async fn list_invocations(&self, tool_id: &str) -> Result<Vec<Invocation>, RegistryError> {
        self.check_cancelled()?;
        debug!(tool = tool_id, "Listing invocations");
        self.store
            .list_invocations(&self.scope, tool_id)
            .await
            .map_err(|e| RegistryError::from_store("list invocations", e))
    }
}
