#![doc = "Store integration for the CLI: implements the core `ItemStore` trait against a PostgREST (Supabase) endpoint."]
//
//! # Store Integration (CLI <-> Core)
//!
//! This module bridges the CLI workflow and the [`ItemStore`] abstraction in
//! `catalog-sync-core`. It provides [`RestStore`], the client used by the CLI to count and
//! upsert rows over the PostgREST HTTP dialect.
//!
//! ## Client Usage
//!
//! - Construct [`RestStore`] with [`RestStore::new_from_env`] (`SUPABASE_URL` or
//!   `NEXT_PUBLIC_SUPABASE_URL`, plus `SUPABASE_SERVICE_ROLE_KEY`).
//! - Counting uses `HEAD` with `Prefer: count=exact` and reads the `Content-Range` total.
//! - Upserts `POST` a JSON array with `Prefer: resolution=merge-duplicates`, so every
//!   non-key column is overwritten on conflict.

use async_trait::async_trait;
use catalog_sync_core::contract::{ItemStore, StorageRow, ITEM_ID_COLUMN};
use catalog_sync_core::error::StoreError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::Client;
use std::env;

pub const URL_ENV: &str = "SUPABASE_URL";
pub const URL_ENV_FALLBACK: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

pub struct RestStore {
    client: Client,
    table_url: String,
}

impl RestStore {
    pub fn new(
        base_url: &str,
        api_key: &str,
        table: &str,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(api_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))?,
        );
        let client = Client::builder().default_headers(headers).build()?;
        Ok(RestStore {
            client,
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
        })
    }

    pub fn new_from_env(table: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok(); // loads environment variables from .env if present
        let url = env::var(URL_ENV).or_else(|_| env::var(URL_ENV_FALLBACK));
        match (url, env::var(KEY_ENV)) {
            (Ok(url), Ok(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                tracing::info!(
                    url = %url,
                    table,
                    api_key_set = !key.is_empty(),
                    "Initialized RestStore from environment"
                );
                Self::new(&url, &key, table)
            }
            _ => {
                tracing::error!("Store URL or service role key missing in environment");
                Err(format!("Missing {URL_ENV} (or {URL_ENV_FALLBACK}) or {KEY_ENV} in env.").into())
            }
        }
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }
}

/// Extract the total from a `Content-Range` value such as `0-24/3573` or `*/0`.
pub fn parse_content_range_total(value: &str) -> Result<u64, StoreError> {
    value
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .ok_or_else(|| StoreError::InvalidCount(format!("unparseable Content-Range: {value:?}")))
}

async fn status_error(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
    StoreError::Status { status, body }
}

#[async_trait]
impl ItemStore for RestStore {
    async fn count(&self) -> Result<u64, StoreError> {
        let response = self
            .client
            .head(&self.table_url)
            .query(&[("select", ITEM_ID_COLUMN)])
            .header("Prefer", "count=exact")
            .send()
            .await?;

        if !response.status().is_success() {
            let err = status_error(response).await;
            tracing::error!(error = %err, url = %self.table_url, "Failed to count rows");
            return Err(err);
        }

        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .ok_or_else(|| StoreError::InvalidCount("missing Content-Range header".into()))?
            .to_str()
            .map_err(|e| StoreError::InvalidCount(e.to_string()))?;
        let total = parse_content_range_total(header)?;
        tracing::debug!(total, url = %self.table_url, "Counted rows");
        Ok(total)
    }

    async fn upsert(&self, rows: &[StorageRow], conflict_key: &str) -> Result<(), StoreError> {
        tracing::debug!(rows = rows.len(), conflict_key, "Upserting rows");
        let response = self
            .client
            .post(&self.table_url)
            .query(&[("on_conflict", conflict_key)])
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = status_error(response).await;
            tracing::error!(error = %err, url = %self.table_url, "API error upserting rows");
            return Err(err);
        }
        Ok(())
    }
}
