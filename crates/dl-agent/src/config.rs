//! Agent configuration, loadable from TOML.

use serde::Deserialize;

use dl_log_tools::LogToolsConfig;
use dl_webdav::DavConfig;

/// Top-level configuration for the agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Remote log store connection settings.
    pub webdav: DavConfig,
    /// Discovery, reader and analyzer tunables. Optional; defaults apply.
    #[serde(default)]
    pub tools: LogToolsConfig,
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.tools.validate()?;
        Ok(config)
    }
}
