//! Tool domain entities

use super::value_objects::{Pricing, ToolSchema};
use crate::core::error::DomainError;
use crate::core::identity::tool_did;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timeout applied when a registration carries a non-positive value
pub const DEFAULT_TIMEOUT_MS: i64 = 30_000;

/// A registered, versioned, schema-described capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub schema: ToolSchema,
    pub pricing: Pricing,
    pub provider_id: String,
    pub endpoint: String,
    pub timeout_ms: i64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Tool {
    /// `name@version`, the human-facing slot of this tool
    pub fn slot(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Input for tool registration
///
/// Every field defaults so that a missing field surfaces as a validation
/// error naming it, not as a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterToolRequest {
    pub name: String,
    pub version: String,
    pub description: String,
    pub schema: ToolSchema,
    pub pricing: Option<Pricing>,
    pub endpoint: String,
    pub timeout_ms: i64,
    pub tags: Vec<String>,
}

impl RegisterToolRequest {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        endpoint: impl Into<String>,
        schema: ToolSchema,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            endpoint: endpoint.into(),
            schema,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the request, apply defaults and derive the tool identity.
    ///
    /// Defaults: non-positive timeout becomes [`DEFAULT_TIMEOUT_MS`], a
    /// missing pricing descriptor becomes free.
    pub fn into_tool(self, provider_id: &str, now: DateTime<Utc>) -> Result<Tool, DomainError> {
        let name = required("name", self.name)?;
        let version = required("version", self.version)?;
        let endpoint = required("endpoint", self.endpoint)?;
        if provider_id.trim().is_empty() {
            return Err(DomainError::MissingField("provider_id"));
        }

        self.schema.validate()?;
        let pricing = self.pricing.unwrap_or_default();
        pricing.validate()?;
        let tags = normalize_tags(self.tags)?;

        Ok(Tool {
            id: tool_did(&name, &version, provider_id),
            name,
            version,
            description: self.description,
            schema: self.schema,
            pricing,
            provider_id: provider_id.to_string(),
            endpoint,
            timeout_ms: coerce_timeout(self.timeout_ms),
            tags,
            created_at: now,
            updated_at: now,
            is_active: true,
        })
    }
}

/// Changes to the mutable fields of a tool
///
/// `name`, `version` and `schema` are absent on purpose: changing them
/// means registering a new version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ToolUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.pricing.is_none()
            && self.endpoint.is_none()
            && self.timeout_ms.is_none()
            && self.tags.is_none()
    }

    /// Validate and apply the same defaults as registration
    pub fn normalize(self) -> Result<Self, DomainError> {
        let endpoint = self.endpoint.map(|e| required("endpoint", e)).transpose()?;
        if let Some(pricing) = &self.pricing {
            pricing.validate()?;
        }
        let tags = self.tags.map(normalize_tags).transpose()?;

        Ok(Self {
            description: self.description,
            pricing: self.pricing,
            endpoint,
            timeout_ms: self.timeout_ms.map(coerce_timeout),
            tags,
        })
    }
}

/// Non-positive timeouts fall back to the default
pub fn coerce_timeout(timeout_ms: i64) -> i64 {
    if timeout_ms <= 0 {
        DEFAULT_TIMEOUT_MS
    } else {
        timeout_ms
    }
}

/// Trim tags, drop blanks and duplicates, reject separators
pub fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, DomainError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.contains(',') {
            return Err(DomainError::InvalidTag(tag.to_string()));
        }
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    Ok(out)
}

fn required(field: &'static str, value: String) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DomainError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}
