//! BatchWriter: sequential, paced upserts of fixed-size chunks.
//!
//! There is no run-wide transaction. When a chunk fails, the chunks before it remain
//! committed and the ones after it are never sent; rerunning the whole sync is safe because
//! every write is an upsert on [`ITEM_ID_COLUMN`].

use tracing::{error, info};

use crate::config::SyncConfig;
use crate::contract::{ItemStore, StorageRow, ITEM_ID_COLUMN};
use crate::error::{ConfigError, WriteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteReport {
    pub batches: usize,
    pub rows: usize,
}

pub async fn write_batches<S>(
    store: &S,
    rows: &[StorageRow],
    config: &SyncConfig,
) -> Result<WriteReport, WriteError>
where
    S: ItemStore + ?Sized,
{
    if config.batch_size == 0 {
        return Err(ConfigError::ZeroBatchSize.into());
    }
    let total_batches = rows.len().div_ceil(config.batch_size);
    let mut report = WriteReport::default();

    for (index, chunk) in rows.chunks(config.batch_size).enumerate() {
        if index > 0 && config.write_delay_ms > 0 {
            tokio::time::sleep(config.write_delay()).await;
        }

        let batch = index + 1;
        if let Err(source) = store.upsert(chunk, ITEM_ID_COLUMN).await {
            error!(
                batch,
                total_batches,
                committed_rows = report.rows,
                error = %source,
                "[WRITE][ERROR] Upsert failed, aborting remaining batches"
            );
            return Err(WriteError::Batch {
                batch,
                committed_batches: report.batches,
                committed_rows: report.rows,
                source,
            });
        }

        report.batches += 1;
        report.rows += chunk.len();
        info!(
            batch,
            total_batches,
            rows = chunk.len(),
            "[WRITE] Batch upserted"
        );
    }

    Ok(report)
}
