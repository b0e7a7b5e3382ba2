//! Provider entities

use crate::core::decimal::check_decimal;
use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity used when a caller presents no credential
pub const ANONYMOUS_PROVIDER_ID: &str = "did:claw:agent:anonymous";

/// An agent that offers tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    pub pubkey: String,
    pub stake_claw: String,
    pub reputation: i64,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Provider {
    /// Provider row materialized by a tool registration before the provider
    /// has registered itself
    pub fn placeholder(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            endpoint: String::new(),
            pubkey: String::new(),
            stake_claw: "0".to_string(),
            reputation: 0,
            created_at: now,
            last_seen: now,
        }
    }

    /// True until the provider registers with an endpoint and key
    pub fn is_placeholder(&self) -> bool {
        self.endpoint.is_empty() && self.pubkey.is_empty()
    }
}

/// Input for explicit provider registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterProviderRequest {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    pub pubkey: String,
    pub stake_claw: String,
}

impl RegisterProviderRequest {
    pub fn new(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        pubkey: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            pubkey: pubkey.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_stake(mut self, stake_claw: impl Into<String>) -> Self {
        self.stake_claw = stake_claw.into();
        self
    }

    /// Validate and build the provider record to upsert.
    ///
    /// `reputation` starts at zero; the store keeps the persisted value on
    /// conflict, along with `created_at`.
    pub fn into_provider(self, now: DateTime<Utc>) -> Result<Provider, DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::MissingField("provider id"));
        }
        if self.endpoint.trim().is_empty() {
            return Err(DomainError::MissingField("endpoint"));
        }
        if self.pubkey.trim().is_empty() {
            return Err(DomainError::MissingField("pubkey"));
        }
        let stake_claw = if self.stake_claw.trim().is_empty() {
            "0".to_string()
        } else {
            self.stake_claw.trim().to_string()
        };
        check_decimal("stake_claw", &stake_claw)?;

        Ok(Provider {
            id: self.id.trim().to_string(),
            name: self.name,
            endpoint: self.endpoint.trim().to_string(),
            pubkey: self.pubkey.trim().to_string(),
            stake_claw,
            reputation: 0,
            created_at: now,
            last_seen: now,
        })
    }
}

/// Resolve a raw credential into the requesting provider's ID.
///
/// A `Bearer ` prefix is stripped. Absent or blank credentials resolve to
/// [`ANONYMOUS_PROVIDER_ID`] rather than an error.
pub fn resolve_requester(credential: Option<&str>) -> String {
    let raw = credential.unwrap_or_default().trim();
    let id = match raw.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => raw,
    };
    if id.is_empty() {
        ANONYMOUS_PROVIDER_ID.to_string()
    } else {
        id.to_string()
    }
}
