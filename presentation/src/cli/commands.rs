//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored output
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

/// CLI arguments for agent-tools
#[derive(Parser, Debug)]
#[command(name = "agent-tools")]
#[command(author, version, about = "Registry of agent-callable tools")]
#[command(long_about = r#"
agent-tools keeps a local registry of tools that autonomous agents can call:
who provides them, what their schemas and prices are, and an audit log of
every invocation.

Configuration files are loaded from (in priority order):
1. AGENT_TOOLS_* environment variables
2. --config <path>                       Explicit config file
3. ./agent-tools.toml                    Project-level config
4. ~/.config/agent-tools/config.toml     Global config

Example:
  agent-tools init
  agent-tools --as did:claw:agent:me tool register --file auditor.json
  agent-tools tool search -q solidity --max-price 1
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Database path (overrides store.path)
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Act as this provider DID (overrides identity.provider_id)
    #[arg(long = "as", value_name = "DID", global = true)]
    pub as_provider: Option<String>,

    /// Abort store operations after this many seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a starter agent-tools.toml and create the data directory
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Register, discover and manage tools
    #[command(subcommand)]
    Tool(ToolCommand),

    /// Register and inspect providers
    #[command(subcommand)]
    Provider(ProviderCommand),

    /// Record and finish tool invocations
    #[command(subcommand)]
    Invocation(InvocationCommand),
}

#[derive(Subcommand, Debug)]
pub enum ToolCommand {
    /// Register a tool from a JSON request file ("-" reads stdin)
    Register {
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Show one tool, active or not
    Get { id: String },

    /// List active tools, newest first
    List {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Full-text search over active tools
    Search {
        /// Search terms (prefix matched); empty lists everything
        #[arg(short, long, default_value = "")]
        query: String,

        /// Only tools carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Only tools owned by this provider
        #[arg(long)]
        provider: Option<String>,

        /// Maximum price in CLAW (free tools always match)
        #[arg(long, value_name = "CLAW")]
        max_price: Option<f64>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Change mutable fields of a tool you own
    Update(UpdateArgs),

    /// Hide a tool you own from discovery
    Deactivate { id: String },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: i64,

    /// Results per page (1-100)
    #[arg(long, default_value_t = 20)]
    pub limit: i64,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub endpoint: Option<String>,

    /// Invocation timeout in milliseconds (<= 0 resets to the default)
    #[arg(long)]
    pub timeout_ms: Option<i64>,

    /// Pricing model: free, per_call, per_token or subscription
    #[arg(long, value_name = "MODEL")]
    pub pricing: Option<String>,

    /// Price in CLAW for the pricing model
    #[arg(long, value_name = "CLAW", requires = "pricing")]
    pub amount: Option<String>,

    /// Replace the tag set (repeat or comma-separate)
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Option<Vec<String>>,
}

#[derive(Subcommand, Debug)]
pub enum ProviderCommand {
    /// Register or update a provider
    Register {
        #[arg(long)]
        id: String,

        #[arg(long)]
        endpoint: String,

        #[arg(long)]
        pubkey: String,

        #[arg(long, default_value = "")]
        name: String,

        /// Stake in CLAW
        #[arg(long, default_value = "0")]
        stake: String,
    },

    Get { id: String },

    List,
}

#[derive(Subcommand, Debug)]
pub enum InvocationCommand {
    /// Start tracking a call to a tool
    Record {
        #[arg(long = "tool", value_name = "TOOL_ID")]
        tool_id: String,

        /// Calling agent (defaults to the anonymous agent)
        #[arg(long, default_value = "")]
        consumer: String,

        /// Request payload as JSON; only its digest is stored
        #[arg(long, default_value = "{}")]
        input: String,
    },

    /// Mark a pending invocation as completed
    Complete {
        id: String,

        #[arg(long)]
        output_hash: String,

        #[arg(long, default_value = "")]
        receipt_sig: String,

        /// Cost in CLAW
        #[arg(long, default_value = "")]
        cost: String,
    },

    /// Mark a pending invocation as failed
    Fail {
        id: String,

        #[arg(long)]
        reason: String,
    },

    /// Mark a pending invocation as timed out
    Timeout { id: String },

    Get { id: String },

    /// Invocations of one tool, newest first
    List {
        #[arg(long = "tool", value_name = "TOOL_ID")]
        tool_id: String,
    },
}
