/// `load_config` module: Loads a static YAML config into the typed settings used by the CLI.
///
/// This module is the only place where untrusted YAML is parsed and mapped to strongly-typed
/// structs. Every section is optional and falls back to the built-in defaults, so running
/// without a config file is equivalent to loading an empty one.
///
/// # Errors
/// All errors in this module use `anyhow::Error` for context-rich diagnostics, and are surfaced at the CLI boundary.
///
/// Secrets (store URL and key) are never read from the file; see [`crate::store`].
use anyhow::Result;
use catalog_sync_core::config::SyncConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_BASE_URL: &str = "https://metaforge.app/api/arc-raiders/items";
pub const DEFAULT_TABLE: &str = "ar_items";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub source: SourceSection,
    pub store: StoreSection,
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub table: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

/// Loads a static YAML config file (no secrets).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty document deserialises as unit, not as a map.
    let config: CliConfig = if config_content.trim().is_empty() {
        CliConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    config.validate()?;
    Ok(config)
}

impl CliConfig {
    pub fn validate(&self) -> Result<()> {
        self.sync.validate().map_err(|e| {
            error!(error = %e, "Invalid sync section in config");
            anyhow::anyhow!("Invalid sync configuration: {e}")
        })?;
        if self.source.base_url.trim().is_empty() {
            anyhow::bail!("source.base_url must not be empty");
        }
        if self.store.table.trim().is_empty() {
            anyhow::bail!("store.table must not be empty");
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            base_url = %self.source.base_url,
            table = %self.store.table,
            "Loaded CliConfig"
        );
        self.sync.trace_loaded();
    }
}
