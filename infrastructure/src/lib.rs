//! Infrastructure layer for agent-tools
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigSource, ConfigValidationError, ENV_PREFIX, FileConfig,
    FileIdentityConfig, FileLogConfig, FileStoreConfig, PROJECT_CONFIG_FILES,
};
pub use store::{MEMORY_PATH, SqliteStore, StoreOptions};

impl From<&FileStoreConfig> for StoreOptions {
    fn from(config: &FileStoreConfig) -> Self {
        StoreOptions::new(&config.path)
            .with_pool_size(config.pool_size)
            .with_busy_timeout_ms(config.busy_timeout_ms)
    }
}
