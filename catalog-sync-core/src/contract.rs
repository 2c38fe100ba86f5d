#![allow(unused)]

//! # contract: data shapes and the two I/O seams of a sync run
//!
//! This module defines the records that flow through the pipeline and the traits the
//! pipeline talks to:
//!
//! - [`CatalogSource`]: fetches one page of the upstream catalog.
//! - [`ItemStore`]: counts rows and upserts batches of rows into the destination collection.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` so consumers can generate deterministic mocks.
//!   The mocks are exported under the default `test-export-mocks` feature.
//!
//! ## Adding New Backends
//! - Implement the trait for your backend and map every transport or status failure to the
//!   matching error type from [`crate::error`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mockall::{automock, predicate::*};

use crate::error::{FetchError, StoreError};

/// One item as published by the upstream catalog.
///
/// Every field is optional on the wire. A missing `id` is rejected during normalisation,
/// not while decoding, so that a single bad record names its position in the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpstreamItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub loadout_slots: Option<Vec<String>>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    /// Kept as a raw JSON number so integer values are written back as integers.
    #[serde(default)]
    pub value: Option<serde_json::Number>,
}

/// Pagination metadata reported by an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// The upstream reported `totalPages`; `page` may still be absent.
    Paged { page: Option<u64>, total_pages: u64 },
    /// No `totalPages`: the fetcher falls back to the short-page rule.
    Unpaged,
}

/// One decoded fetch response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawEnvelope")]
pub struct PageEnvelope {
    pub items: Vec<UpstreamItem>,
    pub pagination: Pagination,
    /// Page size the upstream says it applied; logged next to the requested size.
    pub limit: Option<u64>,
    pub total: Option<u64>,
}

impl PageEnvelope {
    /// An envelope without any advisory metadata.
    pub fn bare(items: Vec<UpstreamItem>) -> Self {
        Self {
            items,
            pagination: Pagination::Unpaged,
            limit: None,
            total: None,
        }
    }

    pub fn with_pages(mut self, page: u64, total_pages: u64) -> Self {
        self.pagination = Pagination::Paged {
            page: Some(page),
            total_pages,
        };
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

/// Wire shape of the upstream response: `{ data, page?, limit?, total?, totalPages? }`.
///
/// The counters are advisory, so they are decoded as loose JSON and a value that is not a
/// non-negative integer is dropped instead of failing the whole page.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    data: Option<Vec<UpstreamItem>>,
    #[serde(default)]
    page: Option<serde_json::Value>,
    #[serde(default)]
    limit: Option<serde_json::Value>,
    #[serde(default)]
    total: Option<serde_json::Value>,
    #[serde(default, rename = "totalPages")]
    total_pages: Option<serde_json::Value>,
}

/// `3`, `3.0` and `"3"` all read as 3; anything else reads as absent.
fn advisory_count(value: Option<serde_json::Value>) -> Option<u64> {
    match value? {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl From<RawEnvelope> for PageEnvelope {
    fn from(raw: RawEnvelope) -> Self {
        let pagination = match advisory_count(raw.total_pages) {
            Some(total_pages) => Pagination::Paged {
                page: advisory_count(raw.page),
                total_pages,
            },
            None => Pagination::Unpaged,
        };
        PageEnvelope {
            items: raw.data.unwrap_or_default(),
            pagination,
            limit: advisory_count(raw.limit),
            total: advisory_count(raw.total),
        }
    }
}

/// Name of the identifier column used as the upsert conflict key.
pub const ITEM_ID_COLUMN: &str = "item_id";

/// A row as written to the store. All fields are always serialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRow {
    pub item_id: String,
    pub name: String,
    pub description: String,
    pub item_type: String,
    /// JSON-encoded array of slot tags, e.g. `["primary","secondary"]`.
    pub loadout_slots: String,
    pub icon: String,
    pub rarity: String,
    pub value: Option<serde_json::Number>,
}

impl StorageRow {
    /// Decodes the stored loadout slot list.
    pub fn loadout_slots(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.loadout_slots)
    }
}

/// Trait for reading the upstream catalog one page at a time.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch page `page` (1-based) holding at most `limit` items.
    async fn fetch_page(&self, page: u64, limit: u64) -> Result<PageEnvelope, FetchError>;
}

/// Trait for the destination collection.
///
/// The implementor is responsible for connecting to the backing service; the pipeline only
/// needs a row count and an upsert that overwrites every non-key column on conflict.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Number of rows currently in the target collection.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Insert or overwrite `rows`, resolving conflicts on `conflict_key`.
    async fn upsert(&self, rows: &[StorageRow], conflict_key: &str) -> Result<(), StoreError>;
}
