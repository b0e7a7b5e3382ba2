//! Caller-supplied cancellation scope
//!
//! Every store operation receives a [`Cancellation`]. Adapters check it
//! before starting work and again right before committing, so a cancelled
//! operation either committed fully before the signal or left no writes.

use super::registry_store::StoreError;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token and/or deadline attached to one registry operation
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A scope that never cancels
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// True once the token fired or the deadline passed
    pub fn is_cancelled(&self) -> bool {
        if let Some(token) = &self.token
            && token.is_cancelled()
        {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    /// Returns `Err(StoreError::Cancelled)` if the scope is no longer live
    pub fn check(&self) -> Result<(), StoreError> {
        if self.is_cancelled() {
            Err(StoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}
