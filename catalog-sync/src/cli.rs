///
/// This module implements the CLI interface for catalog-sync: command parsing, configuration
/// assembly, and the user-visible summary of a run.
///
/// All core business logic (fetching, normalising, writing, verifying) lives in the
/// [`catalog-sync-core`] crate. This module is strictly for CLI glue and orchestration.
///
/// ## How To Use
/// - For command-line users: use the installed `catalog-sync` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`catalog-sync-core`]: ../../catalog-sync-core/
use crate::load_config::{load_config, CliConfig};
use crate::store::RestStore;
use anyhow::Result;
use catalog_sync_core::contract::ItemStore;
use catalog_sync_core::fetch::HttpCatalogSource;
use catalog_sync_core::synchronise::synchronise;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// CLI for catalog-sync: mirror a paginated catalog API into a store.
#[derive(Parser)]
#[clap(
    name = "catalog-sync",
    version,
    about = "Mirror a paginated catalog API into a PostgREST table, idempotently"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every catalog page and upsert all items into the store
    Sync {
        /// Path to the YAML config file (defaults apply when omitted)
        #[clap(long)]
        config: Option<PathBuf>,

        #[clap(flatten)]
        overrides: Overrides,
    },
    /// Print the number of rows currently in the store
    Count {
        /// Path to the YAML config file (defaults apply when omitted)
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Upstream catalog endpoint
    #[clap(long)]
    pub base_url: Option<String>,
    /// Items requested per page
    #[clap(long)]
    pub page_size: Option<u64>,
    /// Rows per upsert request
    #[clap(long)]
    pub batch_size: Option<usize>,
    /// Pause between page requests, in milliseconds
    #[clap(long)]
    pub fetch_delay_ms: Option<u64>,
    /// Pause between upsert batches, in milliseconds
    #[clap(long)]
    pub write_delay_ms: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, config: &mut CliConfig) {
        if let Some(base_url) = &self.base_url {
            config.source.base_url = base_url.clone();
        }
        if let Some(page_size) = self.page_size {
            config.sync.page_size = page_size;
        }
        if let Some(batch_size) = self.batch_size {
            config.sync.batch_size = batch_size;
        }
        if let Some(fetch_delay_ms) = self.fetch_delay_ms {
            config.sync.fetch_delay_ms = fetch_delay_ms;
        }
        if let Some(write_delay_ms) = self.write_delay_ms {
            config.sync.write_delay_ms = write_delay_ms;
        }
    }
}

/// Load the config file if one was given, otherwise start from defaults.
pub fn resolve_config(path: Option<PathBuf>, overrides: &Overrides) -> Result<CliConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => CliConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    config.trace_loaded();
    Ok(config)
}

fn store_from_env(config: &CliConfig) -> Result<RestStore> {
    RestStore::new_from_env(&config.store.table).map_err(|e| anyhow::Error::msg(e.to_string()))
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config, overrides } => {
            let config = resolve_config(config, &overrides)?;
            let store = store_from_env(&config)?;
            let source = HttpCatalogSource::new(
                config.source.base_url.clone(),
                Duration::from_secs(config.source.timeout_secs),
            )?;
            tracing::info!(command = "sync", "Starting synchronisation process");

            match synchronise(&config.sync, &source, &store).await {
                Ok(report) => {
                    tracing::info!(command = "sync", ?report, "Synchronisation complete");
                    println!("{}", report.summary());
                    if report.verdict.is_consistent() {
                        println!("{}", report.verdict);
                    } else {
                        eprintln!("{}", report.verdict);
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", stage = ?e.stage(), error = %e, "Synchronisation failed");
                    Err(anyhow::Error::new(e).context("Sync failed"))
                }
            }
        }
        Commands::Count { config } => {
            let config = resolve_config(config, &Overrides::default())?;
            let store = store_from_env(&config)?;
            let count = store.count().await?;
            tracing::info!(command = "count", count, table = %config.store.table, "Counted rows");
            println!("{}: {count} rows", config.store.table);
            Ok(())
        }
    }
}
