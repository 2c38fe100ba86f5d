use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ConfigError;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_FETCH_DELAY_MS: u64 = 350;
pub const DEFAULT_WRITE_DELAY_MS: u64 = 250;

/// Pacing and sizing of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Items requested per upstream page.
    pub page_size: u64,
    /// Rows per upsert request.
    pub batch_size: usize,
    /// Pause between consecutive page requests.
    pub fetch_delay_ms: u64,
    /// Pause between consecutive upsert batches.
    pub write_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            fetch_delay_ms: DEFAULT_FETCH_DELAY_MS,
            write_delay_ms: DEFAULT_WRITE_DELAY_MS,
        }
    }
}

impl SyncConfig {
    /// A config with both delays disabled, handy for tests and local stores.
    pub fn without_delays(self) -> Self {
        Self {
            fetch_delay_ms: 0,
            write_delay_ms: 0,
            ..self
        }
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            page_size = self.page_size,
            batch_size = self.batch_size,
            fetch_delay_ms = self.fetch_delay_ms,
            write_delay_ms = self.write_delay_ms,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}
