//! Error types for catalog-sync-core

use crate::synchronise::SyncState;

/// Failure while paginating the upstream catalog.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
}

/// Failure reported by an [`crate::contract::ItemStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store did not report a usable row count: {0}")]
    InvalidCount(String),

    #[error("{0}")]
    Other(String),
}

/// Failure of the batch writer.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("invalid batch configuration: {0}")]
    Config(#[from] ConfigError),

    /// A batch upsert failed. Earlier batches stay committed.
    #[error("upsert of batch {batch} failed after {committed_batches} committed batches ({committed_rows} rows): {source}")]
    Batch {
        /// 1-based index of the failing batch.
        batch: usize,
        committed_batches: usize,
        committed_rows: usize,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("upstream item at position {index} has no identifier")]
    MissingIdentifier { index: usize },

    #[error("could not encode loadout slots for item {item_id}: {source}")]
    Encode {
        item_id: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("page_size must be greater than zero")]
    ZeroPageSize,

    #[error("batch_size must be greater than zero")]
    ZeroBatchSize,
}

/// Reason a sync run ended in [`SyncState::Aborted`].
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("invalid sync configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("normalisation failed: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("row count failed: {0}")]
    Count(#[from] StoreError),

    #[error("write failed: {0}")]
    Write(#[from] WriteError),
}

impl SyncError {
    /// The state the run was in when it aborted.
    pub fn stage(&self) -> SyncState {
        match self {
            SyncError::Config(_) => SyncState::Idle,
            SyncError::Fetch(_) => SyncState::Fetching,
            SyncError::Normalize(_) => SyncState::Normalizing,
            SyncError::Count(_) | SyncError::Write(_) => SyncState::Writing,
        }
    }
}
