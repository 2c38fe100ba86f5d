//! High-level pipeline: orchestrates fetch → normalise → write → verify for one catalog.
//!
//! # Major Types
//! - [`SynchroniseReport`]: what a completed run observed (counts, batches, verdict)
//! - [`SyncState`]: the run's state machine, `Idle → Fetching → Normalizing → Writing →
//!   Verified | Aborted`
//!
//! # Responsibilities
//! - Fail-fast orchestration: the first failing step aborts the run with a [`SyncError`]
//!   whose [`SyncError::stage`] names where it stopped
//! - Count drift is reported through [`Verdict`] and never turns into an error
//! - Fetching completes before the store is touched, so an upstream failure leaves the
//!   store unchanged
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]

use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::contract::{CatalogSource, ItemStore};
use crate::error::SyncError;
use crate::fetch::{fetch_all, FetchOutcome};
use crate::normalize::normalize_all;
use crate::verify::{verify, Counts, Verdict};
use crate::write::{write_batches, WriteReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Fetching,
    Normalizing,
    Writing,
    Verified,
    Aborted,
}

/// Outcome of a run that reached [`SyncState::Verified`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchroniseReport {
    pub fetched: usize,
    pub pages: u64,
    pub counts: Counts,
    pub written: WriteReport,
    pub verdict: Verdict,
}

impl SynchroniseReport {
    pub fn state(&self) -> SyncState {
        SyncState::Verified
    }

    /// One-line before/after/upstream summary.
    pub fn summary(&self) -> String {
        format!(
            "before: {} | after: {} | upstream total: {} | fetched: {} | written: {} rows in {} batches",
            self.counts.before,
            self.counts.after,
            self.counts.api_count,
            self.fetched,
            self.written.rows,
            self.written.batches,
        )
    }
}

/// Tracks the current state so transitions and aborts are logged with where they came from.
struct Run {
    state: SyncState,
}

impl Run {
    fn advance(&mut self, next: SyncState) {
        info!(from = ?self.state, to = ?next, "[SYNC] State transition");
        self.state = next;
    }

    fn abort(&mut self, err: SyncError) -> SyncError {
        error!(
            from = ?self.state,
            stage = ?err.stage(),
            error = %err,
            "[SYNC][ERROR] Run aborted"
        );
        self.state = SyncState::Aborted;
        err
    }
}

pub async fn synchronise<C, S>(
    config: &SyncConfig,
    source: &C,
    store: &S,
) -> Result<SynchroniseReport, SyncError>
where
    C: CatalogSource + ?Sized,
    S: ItemStore + ?Sized,
{
    let mut run = Run {
        state: SyncState::Idle,
    };
    info!("[SYNC] Starting catalog synchronisation");
    config.validate().map_err(|e| run.abort(e.into()))?;

    // --- Step 1: Fetch ---
    run.advance(SyncState::Fetching);
    let FetchOutcome {
        items,
        pages_fetched,
        api_count,
    } = fetch_all(source, config)
        .await
        .map_err(|e| run.abort(e.into()))?;
    info!(
        items = items.len(),
        pages = pages_fetched,
        api_count,
        "[SYNC] Fetched all pages"
    );

    // --- Step 2: Normalise ---
    run.advance(SyncState::Normalizing);
    let rows = normalize_all(&items).map_err(|e| run.abort(e.into()))?;
    let fetched = items.len();
    drop(items);

    // --- Step 3: Write, bracketed by counts ---
    run.advance(SyncState::Writing);
    let before = store.count().await.map_err(|e| run.abort(e.into()))?;
    info!(before, "[SYNC] Store count before write");

    let written = write_batches(store, &rows, config)
        .await
        .map_err(|e| run.abort(e.into()))?;

    let after = store.count().await.map_err(|e| run.abort(e.into()))?;
    info!(after, "[SYNC] Store count after write");

    // --- Step 4: Verify ---
    let counts = Counts {
        before,
        after,
        api_count,
    };
    let verdict = verify(counts);
    run.advance(SyncState::Verified);
    if !verdict.is_consistent() {
        warn!(%verdict, "[SYNC] Run completed with drift");
    }

    Ok(SynchroniseReport {
        fetched,
        pages: pages_fetched,
        counts,
        written,
        verdict,
    })
}
