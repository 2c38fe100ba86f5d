//! PageFetcher: walks the upstream catalog page by page and decides when it is exhausted.
//!
//! Termination is decided per page by [`next_step`]:
//! - an empty page always ends the walk;
//! - if the envelope reports `totalPages`, the walk ends once the current page reaches it
//!   (reported totals take precedence over the short-page rule);
//! - otherwise a page shorter than the requested page size is taken to be the last one.
//!
//! Requests are strictly sequential and separated by `fetch_delay_ms`; the first request
//! is sent immediately. Any failure aborts the walk without returning partial results.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use crate::config::SyncConfig;
use crate::contract::{CatalogSource, PageEnvelope, Pagination, UpstreamItem};
use crate::error::FetchError;

/// Everything one pagination walk produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// All items of all pages, in page order.
    pub items: Vec<UpstreamItem>,
    pub pages_fetched: u64,
    /// The last reported upstream total, or `items.len()` if none was ever reported.
    pub api_count: u64,
}

/// What to do after a page has been received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    Continue,
    Stop(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EmptyPage,
    LastReportedPage,
    ShortPage,
}

/// Decide whether page `requested` was the last one.
pub fn next_step(envelope: &PageEnvelope, requested: u64, page_size: u64) -> PageStep {
    if envelope.items.is_empty() {
        return PageStep::Stop(StopReason::EmptyPage);
    }
    match envelope.pagination {
        Pagination::Paged { page, total_pages } => {
            if page.unwrap_or(requested) >= total_pages {
                PageStep::Stop(StopReason::LastReportedPage)
            } else {
                PageStep::Continue
            }
        }
        Pagination::Unpaged => {
            if (envelope.items.len() as u64) < page_size {
                PageStep::Stop(StopReason::ShortPage)
            } else {
                PageStep::Continue
            }
        }
    }
}

/// Fetch every page from `source` using the sizing and pacing in `config`.
pub async fn fetch_all<S>(source: &S, config: &SyncConfig) -> Result<FetchOutcome, FetchError>
where
    S: CatalogSource + ?Sized,
{
    let mut items: Vec<UpstreamItem> = Vec::new();
    let mut reported_total: Option<u64> = None;
    let mut page: u64 = 1;

    loop {
        if page > 1 && config.fetch_delay_ms > 0 {
            tokio::time::sleep(config.fetch_delay()).await;
        }

        debug!(page, limit = config.page_size, "[FETCH] Requesting page");
        let envelope = match source.fetch_page(page, config.page_size).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(page, error = %e, "[FETCH][ERROR] Page request failed");
                return Err(e);
            }
        };

        let step = next_step(&envelope, page, config.page_size);
        let received = envelope.items.len();
        // The terminating empty page may still carry the final total.
        if let Some(total) = envelope.total {
            reported_total = Some(total);
        }
        items.extend(envelope.items);

        info!(
            page,
            received,
            accumulated = items.len(),
            requested_limit = config.page_size,
            reported_limit = ?envelope.limit,
            pagination = ?envelope.pagination,
            "[FETCH] Page received"
        );

        match step {
            PageStep::Continue => page += 1,
            PageStep::Stop(reason) => {
                info!(page, ?reason, "[FETCH] Pagination complete");
                break;
            }
        }
    }

    let api_count = reported_total.unwrap_or(items.len() as u64);
    Ok(FetchOutcome {
        items,
        pages_fetched: page,
        api_count,
    })
}

/// [`CatalogSource`] over plain HTTP: `GET <base>?page=<n>&limit=<size>`.
#[derive(Clone)]
pub struct HttpCatalogSource {
    client: Client,
    base_url: String,
}

impl HttpCatalogSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_page(&self, page: u64, limit: u64) -> Result<PageEnvelope, FetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("page", page), ("limit", limit)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!(
                status = %status,
                url = %self.base_url,
                page,
                "Catalog API returned error. Response body: {text}"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str::<PageEnvelope>(&text).map_err(|e| {
            error!(error = ?e, url = %self.base_url, page, "Failed to parse catalog page JSON");
            FetchError::Decode(e.to_string())
        })
    }
}
