use std::sync::Arc;
use std::time::Duration;

use storefront_feed::{
    CacheOptions, CatalogCache, CatalogError, FeedController, FeedErrorKind, FeedStatus,
    FilterKey, LoadOutcome,
};

use crate::support::{feed, GatedCatalog, PAGE_SIZE};

fn network_down() -> CatalogError {
    CatalogError::Network("connection refused".into())
}

#[tokio::test]
async fn failed_first_load_leaves_empty_view_with_error() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);
    catalog.fail_next(network_down());

    let err = feed.initialize(FilterKey::all(), None).await.unwrap_err();
    assert_eq!(err.kind, FeedErrorKind::Network);

    let view = feed.view();
    assert_eq!(view.status, FeedStatus::Error);
    assert!(view.is_empty_with_error());
    assert!(!view.is_loading);
    assert!(!view.has_more);

    assert_eq!(feed.retry().await, Ok(LoadOutcome::Loaded));
    assert_eq!(feed.merged_items().len(), 20);
    assert!(feed.view().error.is_none());
}

#[tokio::test]
async fn failed_load_more_keeps_pages() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);
    feed.initialize(FilterKey::all(), None).await.unwrap();

    catalog.fail_next(CatalogError::Remote {
        status: 502,
        message: "bad gateway".into(),
    });
    let err = feed.load_more().await.unwrap_err();
    assert_eq!(err.kind, FeedErrorKind::Remote);
    assert_eq!(err.status, Some(502));

    let view = feed.view();
    assert_eq!(view.items.len(), 20);
    assert_eq!(view.status, FeedStatus::Error);
    assert!(!view.is_empty_with_error());

    // Scrolling does not hammer a failing catalog; recovery is explicit.
    assert_eq!(feed.load_more().await, Ok(LoadOutcome::Skipped));

    assert_eq!(feed.retry().await, Ok(LoadOutcome::Loaded));
    assert_eq!(feed.merged_items().len(), 40);
    assert_eq!(feed.status(), FeedStatus::Ready);
}

#[tokio::test]
async fn transient_failure_is_retried_by_the_cache() {
    let catalog = GatedCatalog::open(45);
    let options = CacheOptions::default()
        .with_retries(1)
        .with_retry_delay(Duration::ZERO);
    let cache = CatalogCache::new(catalog.clone(), options, PAGE_SIZE);
    let feed = FeedController::new(Arc::new(cache));

    catalog.fail_next(network_down());
    assert_eq!(feed.initialize(FilterKey::all(), None).await, Ok(LoadOutcome::Loaded));
    assert_eq!(catalog.started(), 2);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let catalog = GatedCatalog::open(45);
    let options = CacheOptions::default()
        .with_retries(1)
        .with_retry_delay(Duration::ZERO);
    let cache = CatalogCache::new(catalog.clone(), options, PAGE_SIZE);
    let feed = FeedController::new(Arc::new(cache));

    catalog.fail_next(CatalogError::Remote {
        status: 400,
        message: "bad request".into(),
    });
    assert!(feed.initialize(FilterKey::all(), None).await.is_err());
    assert_eq!(catalog.started(), 1);
}

#[tokio::test]
async fn failure_does_not_leak_into_other_filters() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);
    catalog.fail_next(network_down());
    assert!(feed.initialize(FilterKey::all(), None).await.is_err());

    let beauty = FilterKey::all().with_category("beauty");
    assert_eq!(feed.change_filter(beauty).await, Ok(LoadOutcome::Loaded));
    assert!(feed.view().error.is_none());
    assert_eq!(feed.merged_items().len(), 15);
}
