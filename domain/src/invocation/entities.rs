//! Invocation entities and lifecycle

use crate::core::decimal::check_decimal;
use crate::core::error::DomainError;
use crate::core::identity::payload_digest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Generated invocation identifier (`inv_<uuid>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(String);

impl InvocationId {
    pub const PREFIX: &'static str = "inv_";

    pub fn new() -> Self {
        Self(format!("{}{}", Self::PREFIX, uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for InvocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for InvocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for InvocationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    /// A failure variant raised when the call exceeded the tool's timeout
    Timeout,
}

impl InvocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationStatus::Pending => "pending",
            InvocationStatus::Completed => "completed",
            InvocationStatus::Failed => "failed",
            InvocationStatus::Timeout => "timeout",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvocationStatus::Pending)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, InvocationStatus::Failed | InvocationStatus::Timeout)
    }

    /// Only `pending -> terminal` is allowed
    pub fn can_transition_to(&self, next: InvocationStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }
}

impl Display for InvocationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvocationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvocationStatus::Pending),
            "completed" => Ok(InvocationStatus::Completed),
            "failed" => Ok(InvocationStatus::Failed),
            "timeout" => Ok(InvocationStatus::Timeout),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Terminal outcome applied to a pending invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    Completed {
        output_hash: String,
        receipt_sig: String,
        cost_claw: String,
    },
    Failed {
        reason: String,
    },
    TimedOut,
}

impl InvocationOutcome {
    pub const TIMEOUT_MESSAGE: &'static str = "invocation timed out";

    pub fn completed(
        output_hash: impl Into<String>,
        receipt_sig: impl Into<String>,
        cost_claw: impl Into<String>,
    ) -> Self {
        InvocationOutcome::Completed {
            output_hash: output_hash.into(),
            receipt_sig: receipt_sig.into(),
            cost_claw: cost_claw.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        InvocationOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> InvocationStatus {
        match self {
            InvocationOutcome::Completed { .. } => InvocationStatus::Completed,
            InvocationOutcome::Failed { .. } => InvocationStatus::Failed,
            InvocationOutcome::TimedOut => InvocationStatus::Timeout,
        }
    }

    /// Error message persisted for failure outcomes
    pub fn error_message(&self) -> Option<&str> {
        match self {
            InvocationOutcome::Completed { .. } => None,
            InvocationOutcome::Failed { reason } => Some(reason),
            InvocationOutcome::TimedOut => Some(Self::TIMEOUT_MESSAGE),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            InvocationOutcome::Completed {
                output_hash,
                cost_claw,
                ..
            } => {
                if output_hash.trim().is_empty() {
                    return Err(DomainError::MissingField("output_hash"));
                }
                check_decimal("cost_claw", cost_claw)
            }
            InvocationOutcome::Failed { reason } if reason.trim().is_empty() => {
                Err(DomainError::MissingField("reason"))
            }
            _ => Ok(()),
        }
    }
}

/// Audit record of one attempt to execute a tool
///
/// Only digests of the request/response bodies are kept, never the bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub id: InvocationId,
    pub tool_id: String,
    pub consumer_id: String,
    pub input_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_sig: Option<String>,
    pub status: InvocationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_claw: Option<String>,
    /// Reserved for a future settlement layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escrow_id: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Invocation {
    /// New pending record; the input payload is reduced to its digest
    pub fn pending(
        tool_id: impl Into<String>,
        consumer_id: impl Into<String>,
        input: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let tool_id = tool_id.into();
        if tool_id.trim().is_empty() {
            return Err(DomainError::MissingField("tool_id"));
        }
        Ok(Self {
            id: InvocationId::new(),
            tool_id,
            consumer_id: consumer_id.into(),
            input_hash: payload_digest(input),
            output_hash: None,
            receipt_sig: None,
            status: InvocationStatus::Pending,
            cost_claw: None,
            escrow_id: None,
            started_at: now,
            completed_at: None,
            error: None,
        })
    }

    /// Apply a terminal outcome in memory
    pub fn apply(
        &mut self,
        outcome: InvocationOutcome,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let next = outcome.status();
        if !self.status.can_transition_to(next) {
            return Err(DomainError::IllegalTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        outcome.validate()?;

        self.error = outcome.error_message().map(str::to_string);
        if let InvocationOutcome::Completed {
            output_hash,
            receipt_sig,
            cost_claw,
        } = outcome
        {
            self.output_hash = Some(output_hash);
            self.receipt_sig = Some(receipt_sig);
            self.cost_claw = Some(cost_claw);
        }
        self.status = next;
        self.completed_at = Some(at);
        Ok(())
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|done| (done - self.started_at).num_milliseconds())
    }
}
