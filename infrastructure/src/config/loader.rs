//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Prefix of environment overrides (`AGENT_TOOLS_STORE__PATH` -> `store.path`)
pub const ENV_PREFIX: &str = "AGENT_TOOLS_";

/// Project-level file names, checked in order
pub const PROJECT_CONFIG_FILES: [&str; 2] = ["agent-tools.toml", ".agent-tools.toml"];

/// One place configuration may come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: &'static str,
    pub path: PathBuf,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `AGENT_TOOLS_*` environment variables
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./agent-tools.toml` or `./.agent-tools.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/agent-tools/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// The merged provider chain, before extraction
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(project_path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&project_path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `$XDG_CONFIG_HOME/agent-tools/config.toml`, or the platform equivalent
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("agent-tools").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// File sources in priority order, for `--show-config`
    pub fn sources(config_path: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = Vec::new();

        if let Some(path) = config_path {
            sources.push(ConfigSource {
                label: "Explicit",
                path: path.to_path_buf(),
                found: path.exists(),
            });
        }

        let project = Self::project_config_path();
        sources.push(ConfigSource {
            label: "Project",
            found: project.is_some(),
            path: project.unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILES[0])),
        });

        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource {
                label: "Global",
                found: path.exists(),
                path,
            });
        }

        sources
    }

    /// Contents written by `agent-tools init`
    pub fn default_config_toml() -> String {
        let defaults = FileConfig::default();
        format!(
            r#"# agent-tools configuration

[store]
# SQLite database file (":memory:" for a throwaway registry)
path = "{path}"
pool_size = {pool_size}
busy_timeout_ms = {busy_timeout_ms}

[log]
# Filter directive used when no -v flag is given
# level = "info"

[identity]
# Provider DID used when --as is not given
# provider_id = "did:claw:agent:example"
"#,
            path = defaults.store.path,
            pool_size = defaults.store.pool_size,
            busy_timeout_ms = defaults.store.busy_timeout_ms,
        )
    }
}
