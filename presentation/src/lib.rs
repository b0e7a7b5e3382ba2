//! Presentation layer for agent-tools
//!
//! This crate contains CLI definitions, input conversion and
//! output formatters.

pub mod cli;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{
    Cli, Command, InvocationCommand, OutputFormat, PageArgs, ProviderCommand, ToolCommand,
    UpdateArgs,
};
pub use cli::input::{parse_payload, parse_register_request};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use output::json::JsonFormatter;

/// Formatter matching the selected output format
pub fn formatter_for(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Table => Box::new(ConsoleFormatter::new()),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
