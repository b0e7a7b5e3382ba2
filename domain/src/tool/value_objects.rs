//! Tool value objects: pricing descriptor and schema pair

use crate::core::decimal::check_decimal;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// How a tool charges for invocations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    #[default]
    Free,
    PerCall,
    PerToken,
    Subscription,
}

impl PricingModel {
    pub fn as_str(&self) -> &str {
        match self {
            PricingModel::Free => "free",
            PricingModel::PerCall => "per_call",
            PricingModel::PerToken => "per_token",
            PricingModel::Subscription => "subscription",
        }
    }
}

impl std::fmt::Display for PricingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PricingModel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "free" => Ok(PricingModel::Free),
            "per_call" => Ok(PricingModel::PerCall),
            "per_token" => Ok(PricingModel::PerToken),
            "subscription" => Ok(PricingModel::Subscription),
            other => Err(DomainError::InvalidPricing(format!(
                "unknown pricing model: {other}"
            ))),
        }
    }
}

/// Cost structure for invoking a tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub model: PricingModel,
    /// Decimal string; ignored for free tools
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub amount_claw: String,
}

impl Pricing {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn new(model: PricingModel, amount_claw: impl Into<String>) -> Self {
        Self {
            model,
            amount_claw: amount_claw.into(),
        }
    }

    pub fn is_free(&self) -> bool {
        self.model == PricingModel::Free
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        check_decimal("amount_claw", &self.amount_claw)
    }
}

impl std::fmt::Display for Pricing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_free() {
            write!(f, "free")
        } else {
            write!(f, "{} CLAW/{}", self.amount_claw, self.model)
        }
    }
}

/// Input/output schema documents of a tool
///
/// Both sides are arbitrary JSON documents. They are checked for presence and
/// well-formedness only, never against a schema-of-schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(default)]
    pub input: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub output: Value,
}

impl ToolSchema {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            output: Value::Null,
        }
    }

    pub fn with_output(mut self, output: Value) -> Self {
        self.output = output;
        self
    }

    /// Build a schema pair from raw JSON text
    pub fn from_json(input: &str, output: Option<&str>) -> Result<Self, DomainError> {
        let input = parse_document("input", input)?;
        let output = match output.map(str::trim) {
            Some(text) if !text.is_empty() => parse_document("output", text)?,
            _ => Value::Null,
        };
        Ok(Self { input, output })
    }

    /// The input schema is required; the output schema may be absent.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.input.is_null() {
            return Err(DomainError::InvalidSchema {
                which: "input",
                reason: "input schema is required".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_document(which: &'static str, text: &str) -> Result<Value, DomainError> {
    serde_json::from_str(text).map_err(|e| DomainError::InvalidSchema {
        which,
        reason: e.to_string(),
    })
}
