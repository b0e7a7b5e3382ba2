//! Output formatter trait

use agent_tools_application::RegistryError;
use agent_tools_domain::{Invocation, Provider, SearchResult, Tool};

/// Renders command results for the terminal
///
/// Implemented once per `--output` format.
pub trait OutputFormatter {
    fn tool(&self, tool: &Tool) -> String;

    /// A page of discovery results
    fn search_result(&self, result: &SearchResult) -> String;

    fn provider(&self, provider: &Provider) -> String;

    fn providers(&self, providers: &[Provider]) -> String;

    fn invocation(&self, invocation: &Invocation) -> String;

    fn invocations(&self, invocations: &[Invocation]) -> String;

    /// Acknowledgement of a command with no entity to show
    fn message(&self, text: &str) -> String;

    fn error(&self, err: &RegistryError) -> String;
}
