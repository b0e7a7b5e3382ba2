//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("store.path cannot be empty")]
    EmptyStorePath,

    #[error("store.pool_size must be at least 1")]
    InvalidPoolSize,

    #[error("log.level '{0}' is not a valid filter directive")]
    InvalidLogLevel(String),
}

/// `[store]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Database file, or `:memory:`
    pub path: String,
    /// Maximum pooled connections
    pub pool_size: u32,
    /// SQLite busy timeout in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: "./data/agent-tools.db".to_string(),
            pool_size: 8,
            busy_timeout_ms: 5000,
        }
    }
}

/// `[log]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLogConfig {
    /// Filter directive (`info`, `agent_tools=debug`, ...); `-v` wins over it
    pub level: Option<String>,
}

/// `[identity]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileIdentityConfig {
    /// Provider DID used when `--as` is not given
    pub provider_id: Option<String>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub store: FileStoreConfig,
    pub log: FileLogConfig,
    pub identity: FileIdentityConfig,
}

impl FileConfig {
    /// Validate the configuration, returning every problem found
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.store.path.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyStorePath);
        }
        if self.store.pool_size == 0 {
            issues.push(ConfigValidationError::InvalidPoolSize);
        }
        if let Some(level) = &self.log.level
            && (level.trim().is_empty() || level.contains(char::is_whitespace))
        {
            issues.push(ConfigValidationError::InvalidLogLevel(level.clone()));
        }

        issues
    }
}
