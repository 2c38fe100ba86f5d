use std::sync::{Arc, Mutex};
use std::time::Duration;

use catalog_sync_core::config::SyncConfig;
use catalog_sync_core::contract::{MockCatalogSource, PageEnvelope, Pagination, UpstreamItem};
use catalog_sync_core::error::FetchError;
use catalog_sync_core::fetch::{fetch_all, next_step, PageStep, StopReason};

fn item(id: usize) -> UpstreamItem {
    UpstreamItem {
        id: Some(format!("item-{id}")),
        name: Some(format!("Item {id}")),
        ..Default::default()
    }
}

/// `count` items numbered from `start`.
fn items(start: usize, count: usize) -> Vec<UpstreamItem> {
    (start..start + count).map(item).collect()
}

fn ids(items: &[UpstreamItem]) -> Vec<String> {
    items.iter().map(|i| i.id.clone().unwrap()).collect()
}

/// Mock source that serves `pages[n - 1]` for page `n` and panics past the end.
fn source_with_pages(pages: Vec<PageEnvelope>) -> (MockCatalogSource, Arc<Mutex<Vec<u64>>>) {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let log = requested.clone();
    let mut source = MockCatalogSource::new();
    source
        .expect_fetch_page()
        .times(pages.len())
        .returning(move |page, _limit| {
            log.lock().unwrap().push(page);
            Ok(pages[(page - 1) as usize].clone())
        });
    (source, requested)
}

fn config(page_size: u64) -> SyncConfig {
    SyncConfig {
        page_size,
        ..SyncConfig::default()
    }
    .without_delays()
}

#[tokio::test]
async fn stops_on_short_page_and_keeps_page_order() {
    let (source, requested) = source_with_pages(vec![
        PageEnvelope::bare(items(0, 3)),
        PageEnvelope::bare(items(3, 3)),
        PageEnvelope::bare(items(6, 1)),
    ]);

    let outcome = fetch_all(&source, &config(3)).await.expect("fetch succeeds");

    assert_eq!(*requested.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(ids(&outcome.items), ids(&items(0, 7)));
    assert_eq!(outcome.api_count, 7, "falls back to the fetched count");
}

#[tokio::test]
async fn stops_on_empty_page_after_full_pages() {
    let (source, requested) = source_with_pages(vec![
        PageEnvelope::bare(items(0, 2)),
        PageEnvelope::bare(items(2, 2)),
        PageEnvelope::bare(vec![]),
    ]);

    let outcome = fetch_all(&source, &config(2)).await.expect("fetch succeeds");

    assert_eq!(*requested.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(outcome.items.len(), 4);
}

#[tokio::test]
async fn reported_total_pages_take_precedence_over_short_pages() {
    // Page 1 is short but upstream says there are two pages.
    let (source, requested) = source_with_pages(vec![
        PageEnvelope::bare(items(0, 1)).with_pages(1, 2).with_total(3),
        PageEnvelope::bare(items(1, 2)).with_pages(2, 2).with_total(3),
    ]);

    let outcome = fetch_all(&source, &config(5)).await.expect("fetch succeeds");

    assert_eq!(*requested.lock().unwrap(), vec![1, 2]);
    assert_eq!(outcome.items.len(), 3);
    assert_eq!(outcome.api_count, 3);
}

#[tokio::test]
async fn stops_when_reported_page_reaches_total_pages_even_if_full() {
    let (source, requested) = source_with_pages(vec![
        PageEnvelope::bare(items(0, 2)).with_pages(1, 2),
        PageEnvelope::bare(items(2, 2)).with_pages(2, 2),
    ]);

    let outcome = fetch_all(&source, &config(2)).await.expect("fetch succeeds");

    assert_eq!(*requested.lock().unwrap(), vec![1, 2]);
    assert_eq!(outcome.items.len(), 4);
}

#[tokio::test]
async fn api_count_comes_from_the_last_envelope_reporting_a_total() {
    let (source, _) = source_with_pages(vec![
        PageEnvelope::bare(items(0, 2)).with_total(10),
        PageEnvelope::bare(items(2, 2)).with_total(5),
        PageEnvelope::bare(items(4, 1)),
    ]);

    let outcome = fetch_all(&source, &config(2)).await.expect("fetch succeeds");

    assert_eq!(outcome.items.len(), 5);
    assert_eq!(outcome.api_count, 5);
}

#[tokio::test]
async fn total_on_the_terminating_empty_page_is_kept() {
    let (source, _) = source_with_pages(vec![
        PageEnvelope::bare(items(0, 2)).with_total(4),
        PageEnvelope::bare(vec![]).with_total(2),
    ]);

    let outcome = fetch_all(&source, &config(2)).await.expect("fetch succeeds");

    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.api_count, 2);
}

#[tokio::test]
async fn non_success_status_aborts_without_partial_results() {
    let mut source = MockCatalogSource::new();
    source
        .expect_fetch_page()
        .withf(|page, _| *page == 1)
        .times(1)
        .returning(|_, _| Ok(PageEnvelope::bare(items(0, 2))));
    source
        .expect_fetch_page()
        .withf(|page, _| *page == 2)
        .times(1)
        .returning(|_, _| {
            Err(FetchError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            })
        });

    let err = fetch_all(&source, &config(2))
        .await
        .expect_err("second page fails");

    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn requests_are_spaced_by_fetch_delay_and_first_is_immediate() {
    let started = tokio::time::Instant::now();
    let stamps = Arc::new(Mutex::new(Vec::new()));
    let log = stamps.clone();
    let pages = vec![
        PageEnvelope::bare(items(0, 2)),
        PageEnvelope::bare(items(2, 2)),
        PageEnvelope::bare(items(4, 1)),
    ];
    let mut source = MockCatalogSource::new();
    source
        .expect_fetch_page()
        .times(3)
        .returning(move |page, _| {
            log.lock().unwrap().push(tokio::time::Instant::now());
            Ok(pages[(page - 1) as usize].clone())
        });

    let config = SyncConfig {
        page_size: 2,
        fetch_delay_ms: 350,
        ..SyncConfig::default()
    };
    fetch_all(&source, &config).await.expect("fetch succeeds");

    let stamps = stamps.lock().unwrap();
    assert_eq!(stamps[0] - started, Duration::ZERO);
    assert_eq!(stamps[1] - stamps[0], Duration::from_millis(350));
    assert_eq!(stamps[2] - stamps[1], Duration::from_millis(350));
}

#[test]
fn next_step_uses_requested_page_when_only_total_pages_is_reported() {
    let envelope = PageEnvelope {
        items: items(0, 1),
        pagination: Pagination::Paged {
            page: None,
            total_pages: 3,
        },
        limit: None,
        total: None,
    };

    assert_eq!(next_step(&envelope, 2, 10), PageStep::Continue);
    assert_eq!(
        next_step(&envelope, 3, 10),
        PageStep::Stop(StopReason::LastReportedPage)
    );
}

#[test]
fn next_step_empty_page_always_stops() {
    let envelope = PageEnvelope::bare(vec![]).with_pages(1, 9);
    assert_eq!(
        next_step(&envelope, 1, 10),
        PageStep::Stop(StopReason::EmptyPage)
    );
}

#[test]
fn envelope_decodes_advisory_fields_into_pagination() {
    let paged: PageEnvelope = serde_json::from_str(
        r#"{"data":[{"id":"a"}],"page":1,"limit":50,"total":120,"totalPages":3}"#,
    )
    .unwrap();
    assert_eq!(
        paged.pagination,
        Pagination::Paged {
            page: Some(1),
            total_pages: 3
        }
    );
    assert_eq!(paged.total, Some(120));
    assert_eq!(paged.limit, Some(50));

    let bare: PageEnvelope = serde_json::from_str(r#"{"data":[{"id":"a"},{"id":"b"}]}"#).unwrap();
    assert_eq!(bare.pagination, Pagination::Unpaged);
    assert_eq!(bare.items.len(), 2);

    let null_data: PageEnvelope = serde_json::from_str(r#"{"data":null,"page":4}"#).unwrap();
    assert!(null_data.items.is_empty());
}

#[test]
fn envelope_tolerates_malformed_advisory_fields() {
    let loose: PageEnvelope = serde_json::from_str(
        r#"{"data":[{"id":"a"}],"page":"2","limit":null,"total":1.0,"totalPages":3.0}"#,
    )
    .expect("advisory fields never fail the page");
    assert_eq!(
        loose.pagination,
        Pagination::Paged {
            page: Some(2),
            total_pages: 3
        }
    );
    assert_eq!(loose.total, Some(1));
    assert_eq!(loose.limit, None);

    let garbage: PageEnvelope = serde_json::from_str(
        r#"{"data":[{"id":"a"}],"page":-1,"total":1.5,"totalPages":"many"}"#,
    )
    .expect("unusable counters are dropped");
    assert_eq!(garbage.pagination, Pagination::Unpaged);
    assert_eq!(garbage.total, None);
    assert_eq!(garbage.items.len(), 1);
}
