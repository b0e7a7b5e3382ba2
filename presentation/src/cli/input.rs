//! Conversion of raw command-line input into domain requests

use crate::cli::commands::UpdateArgs;
use agent_tools_domain::{DomainError, Pricing, PricingModel, RegisterToolRequest, ToolUpdate};
use serde_json::Value;

/// Parse a registration request document
///
/// Missing fields deserialize to their defaults so registration reports
/// them by name.
pub fn parse_register_request(text: &str) -> Result<RegisterToolRequest, DomainError> {
    serde_json::from_str(text).map_err(|e| DomainError::InvalidSchema {
        which: "request",
        reason: e.to_string(),
    })
}

/// Parse an invocation payload; blank input means an empty object
pub fn parse_payload(text: &str) -> Result<Value, DomainError> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(text).map_err(|e| DomainError::InvalidSchema {
        which: "input",
        reason: e.to_string(),
    })
}

impl TryFrom<UpdateArgs> for ToolUpdate {
    type Error = DomainError;

    fn try_from(args: UpdateArgs) -> Result<Self, Self::Error> {
        let pricing = args
            .pricing
            .map(|model| -> Result<Pricing, DomainError> {
                let model: PricingModel = model.parse()?;
                Ok(Pricing::new(model, args.amount.unwrap_or_default()))
            })
            .transpose()?;

        Ok(ToolUpdate {
            description: args.description,
            pricing,
            endpoint: args.endpoint,
            timeout_ms: args.timeout_ms,
            tags: args.tags,
        })
    }
}
