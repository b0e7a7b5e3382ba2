//! Console output formatter for registry results

use crate::output::formatter::OutputFormatter;
use agent_tools_application::RegistryError;
use agent_tools_domain::{Invocation, InvocationStatus, Provider, SearchResult, Tool};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

/// Formats registry results for console display
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn new() -> Self {
        Self
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}\n", line.cyan(), title.bold(), line.cyan())
    }

    fn field(label: &str, value: impl std::fmt::Display) -> String {
        format!("  {:<12}{}\n", format!("{}:", label).dimmed(), value)
    }

    fn timestamp(at: &DateTime<Utc>) -> String {
        at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    fn status(status: InvocationStatus) -> ColoredString {
        match status {
            s if s.is_failure() => s.as_str().red(),
            InvocationStatus::Completed => status.as_str().green(),
            _ => status.as_str().yellow(),
        }
    }

    fn tool_title(tool: &Tool) -> String {
        let title = tool.slot().as_str().yellow().bold();
        if tool.is_active {
            title.to_string()
        } else {
            format!("{} {}", title, "[inactive]".red())
        }
    }

    /// One-entry summary used in lists
    fn tool_summary(tool: &Tool) -> String {
        let mut out = format!("{}\n", Self::tool_title(tool));
        out.push_str(&Self::field("ID", &tool.id));
        if !tool.description.is_empty() {
            out.push_str(&Self::field("About", &tool.description));
        }
        out.push_str(&Self::field("Price", &tool.pricing));
        if !tool.tags.is_empty() {
            out.push_str(&Self::field("Tags", tool.tags.join(", ")));
        }
        out
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn tool(&self, tool: &Tool) -> String {
        let mut out = Self::header("Tool");
        out.push_str(&format!("\n{}\n", Self::tool_title(tool)));
        out.push_str(&Self::field("ID", &tool.id));
        out.push_str(&Self::field("Provider", &tool.provider_id));
        out.push_str(&Self::field("Endpoint", &tool.endpoint));
        out.push_str(&Self::field("Price", &tool.pricing));
        out.push_str(&Self::field("Timeout", format!("{} ms", tool.timeout_ms)));
        if !tool.tags.is_empty() {
            out.push_str(&Self::field("Tags", tool.tags.join(", ")));
        }
        out.push_str(&Self::field("Created", Self::timestamp(&tool.created_at)));
        out.push_str(&Self::field("Updated", Self::timestamp(&tool.updated_at)));
        if !tool.description.is_empty() {
            out.push_str(&format!("\n{}\n", tool.description));
        }
        out.push_str(&format!(
            "\n{}\n{}\n",
            "Input schema:".cyan().bold(),
            serde_json::to_string_pretty(&tool.schema.input).unwrap_or_default()
        ));
        if !tool.schema.output.is_null() {
            out.push_str(&format!(
                "{}\n{}\n",
                "Output schema:".cyan().bold(),
                serde_json::to_string_pretty(&tool.schema.output).unwrap_or_default()
            ));
        }
        out
    }

    fn search_result(&self, result: &SearchResult) -> String {
        if result.tools.is_empty() {
            return match &result.query {
                Some(q) => format!("No tools found for query: {:?}\n", q),
                None => "No tools registered.\n".to_string(),
            };
        }

        let mut out = format!(
            "{} {} {}\n\n",
            format!("Found {} tools", result.total).cyan().bold(),
            format!("(page {} of {})", result.page, result.total_pages().max(1)).dimmed(),
            result
                .query
                .as_deref()
                .map(|q| format!("for {:?}", q))
                .unwrap_or_default()
        );
        for tool in &result.tools {
            out.push_str(&Self::tool_summary(tool));
            out.push('\n');
        }
        out
    }

    fn provider(&self, provider: &Provider) -> String {
        let name = if provider.name.is_empty() {
            "(unnamed)"
        } else {
            &provider.name
        };
        let mut out = format!("{}\n", name.yellow().bold());
        out.push_str(&Self::field("ID", &provider.id));
        if provider.is_placeholder() {
            out.push_str(&Self::field("Status", "not yet registered".dimmed()));
        } else {
            out.push_str(&Self::field("Endpoint", &provider.endpoint));
            out.push_str(&Self::field("Pubkey", &provider.pubkey));
        }
        out.push_str(&Self::field("Stake", format!("{} CLAW", provider.stake_claw)));
        out.push_str(&Self::field("Reputation", provider.reputation));
        out.push_str(&Self::field("Last seen", Self::timestamp(&provider.last_seen)));
        out
    }

    fn providers(&self, providers: &[Provider]) -> String {
        if providers.is_empty() {
            return "No providers registered.\n".to_string();
        }
        providers
            .iter()
            .map(|p| self.provider(p))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn invocation(&self, invocation: &Invocation) -> String {
        let mut out = format!(
            "{} {}\n",
            invocation.id.as_str().bold(),
            Self::status(invocation.status)
        );
        out.push_str(&Self::field("Tool", &invocation.tool_id));
        out.push_str(&Self::field("Consumer", &invocation.consumer_id));
        out.push_str(&Self::field("Input", &invocation.input_hash));
        if let Some(output) = &invocation.output_hash {
            out.push_str(&Self::field("Output", output));
        }
        if let Some(sig) = invocation.receipt_sig.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(&Self::field("Receipt", sig));
        }
        if let Some(cost) = invocation.cost_claw.as_deref().filter(|c| !c.is_empty()) {
            out.push_str(&Self::field("Cost", format!("{} CLAW", cost)));
        }
        out.push_str(&Self::field("Started", Self::timestamp(&invocation.started_at)));
        if let Some(ms) = invocation.duration_ms() {
            out.push_str(&Self::field("Duration", format!("{} ms", ms)));
        }
        if let Some(error) = &invocation.error {
            out.push_str(&Self::field("Error", error.red()));
        }
        out
    }

    fn invocations(&self, invocations: &[Invocation]) -> String {
        if invocations.is_empty() {
            return "No invocations recorded.\n".to_string();
        }
        invocations
            .iter()
            .map(|i| self.invocation(i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn message(&self, text: &str) -> String {
        format!("{} {}\n", "✓".green().bold(), text)
    }

    fn error(&self, err: &RegistryError) -> String {
        format!("{} [{}] {}\n", "Error:".red().bold(), err.code(), err)
    }
}
