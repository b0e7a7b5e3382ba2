//! Configuration file loading for agent-tools
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `AGENT_TOOLS_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./agent-tools.toml` or `./.agent-tools.toml`
//! 4. Global: `$XDG_CONFIG_HOME/agent-tools/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileIdentityConfig, FileLogConfig, FileStoreConfig,
};
pub use loader::{ConfigLoader, ConfigSource, ENV_PREFIX, PROJECT_CONFIG_FILES};
