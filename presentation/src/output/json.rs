//! JSON output formatter
//!
//! Entities print with their wire field names. Errors use the
//! `{"error": {"code", "message"}}` envelope.

use crate::output::formatter::OutputFormatter;
use agent_tools_application::RegistryError;
use agent_tools_domain::{Invocation, Provider, SearchResult, Tool};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    fn render<T: Serialize + ?Sized>(value: &T) -> String {
        let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
        out.push('\n');
        out
    }
}

impl OutputFormatter for JsonFormatter {
    fn tool(&self, tool: &Tool) -> String {
        Self::render(tool)
    }

    fn search_result(&self, result: &SearchResult) -> String {
        Self::render(result)
    }

    fn provider(&self, provider: &Provider) -> String {
        Self::render(provider)
    }

    fn providers(&self, providers: &[Provider]) -> String {
        Self::render(providers)
    }

    fn invocation(&self, invocation: &Invocation) -> String {
        Self::render(invocation)
    }

    fn invocations(&self, invocations: &[Invocation]) -> String {
        Self::render(invocations)
    }

    fn message(&self, text: &str) -> String {
        Self::render(&json!({ "ok": true, "message": text }))
    }

    fn error(&self, err: &RegistryError) -> String {
        Self::render(&json!({
            "error": {
                "code": err.code(),
                "message": err.to_string(),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope() {
        let out = JsonFormatter.error(&RegistryError::Duplicate {
            name: "a".into(),
            version: "1".into(),
        });
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["error"]["code"], "DUPLICATE_TOOL");
        assert!(value["error"]["message"].as_str().unwrap().contains("a@1"));
    }

    #[test]
    fn test_search_result_uses_wire_names() {
        let out = JsonFormatter.search_result(&SearchResult {
            tools: vec![],
            total: 0,
            page: 1,
            limit: 20,
            query: Some("solidity".into()),
        });
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["total"], 0);
        assert_eq!(value["query"], "solidity");
    }

    #[test]
    fn test_message() {
        let value: serde_json::Value =
            serde_json::from_str(&JsonFormatter.message("Tool deactivated")).unwrap();
        assert_eq!(value["ok"], true);
    }
}
