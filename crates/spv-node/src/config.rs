//! Kit configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spv_sync::RelayConfig;
use spv_wallet::WalletConfig;
use std::path::Path;
use tracing::info;

/// Complete kit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Transaction construction configuration.
    #[serde(default)]
    pub wallet: WalletConfig,
    /// Mempool relay configuration.
    #[serde(default)]
    pub relay: RelayConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            wallet: WalletConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

impl KitConfig {
    /// Load configuration, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}
