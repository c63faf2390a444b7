use std::sync::Arc;

use storefront_feed::{
    CatalogCache, FeedController, FeedStatus, FilterKey, LoadOutcome, Page, PageRequest,
};

use crate::support::{feed, ids, options, wait_until, GatedCatalog, PAGE_SIZE};

fn offsets(catalog: &GatedCatalog) -> Vec<u64> {
    catalog
        .inner()
        .page_requests()
        .iter()
        .map(|r| r.offset)
        .collect()
}

#[tokio::test]
async fn exhausts_after_last_page() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);

    assert_eq!(feed.initialize(FilterKey::all(), None).await, Ok(LoadOutcome::Loaded));
    assert_eq!(feed.merged_items().len(), 20);
    assert_eq!(feed.status(), FeedStatus::Ready);

    assert_eq!(feed.request_next_page().await, Ok(LoadOutcome::Loaded));
    assert_eq!(feed.merged_items().len(), 40);

    assert_eq!(feed.request_next_page().await, Ok(LoadOutcome::Loaded));
    assert_eq!(feed.merged_items().len(), 45);
    assert!(feed.is_exhausted());

    assert_eq!(feed.request_next_page().await, Ok(LoadOutcome::Skipped));
    assert_eq!(offsets(&catalog), vec![0, 20, 40]);

    let view = feed.view();
    assert!(!view.has_more);
    assert_eq!(view.total, 45);
    assert_eq!(view.progress_label(), "Showing 45 of 45 products");
}

#[tokio::test]
async fn merged_items_keep_offset_order() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);
    feed.initialize(FilterKey::all(), None).await.unwrap();
    feed.load_more().await.unwrap();
    feed.load_more().await.unwrap();

    let session = feed.session();
    let page_sum: usize = session.pages().iter().map(Page::len).sum();
    assert_eq!(feed.merged_items().len(), page_sum);

    // Default sort is price ascending and generated prices grow with id.
    assert_eq!(ids(&feed.merged_items()), (1..=45).collect::<Vec<u64>>());
}

#[tokio::test]
async fn burst_of_next_page_calls_issues_one_fetch() {
    let catalog = GatedCatalog::gated(45);
    let feed = feed(&catalog);

    catalog.release(1);
    feed.initialize(FilterKey::all(), None).await.unwrap();
    assert_eq!(catalog.started(), 1);

    let calls: Vec<_> = (0..5)
        .map(|_| {
            let feed = Arc::clone(&feed);
            tokio::spawn(async move { feed.request_next_page().await })
        })
        .collect();

    wait_until("the next page fetch to start", || catalog.started() == 2).await;
    assert_eq!(feed.status(), FeedStatus::LoadingMore);
    assert!(feed.view().is_fetching_more);

    catalog.release(1);
    let mut loaded = 0;
    let mut skipped = 0;
    for call in calls {
        match call.await.unwrap() {
            Ok(LoadOutcome::Loaded) => loaded += 1,
            Ok(LoadOutcome::Skipped) => skipped += 1,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!((loaded, skipped), (1, 4));
    assert_eq!(catalog.started(), 2);
    assert_eq!(feed.merged_items().len(), 40);
}

#[tokio::test]
async fn seeded_feed_continues_after_seed() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);
    let key = FilterKey::all();
    let seed = catalog
        .inner()
        .listing(&PageRequest::first(key.clone(), PAGE_SIZE));

    feed.initialize(key, Some(Page::from_response(seed, 0, PAGE_SIZE)))
        .await
        .unwrap();
    assert_eq!(catalog.started(), 0);

    feed.request_next_page().await.unwrap();
    assert_eq!(offsets(&catalog), vec![20]);
    assert_eq!(feed.merged_items().len(), 40);
}

#[tokio::test]
async fn seed_that_covers_everything_is_exhausted() {
    let catalog = GatedCatalog::open(12);
    let feed = feed(&catalog);
    let key = FilterKey::all();
    let seed = catalog
        .inner()
        .listing(&PageRequest::first(key.clone(), PAGE_SIZE));

    feed.initialize(key, Some(Page::from_response(seed, 0, PAGE_SIZE)))
        .await
        .unwrap();

    assert!(feed.is_exhausted());
    assert_eq!(feed.request_next_page().await, Ok(LoadOutcome::Skipped));
    assert_eq!(catalog.started(), 0);
}

#[tokio::test]
async fn empty_result_set_is_exhausted() {
    let catalog = GatedCatalog::open(10);
    let feed = feed(&catalog);

    feed.initialize(FilterKey::all().with_search("no such product"), None)
        .await
        .unwrap();

    let view = feed.view();
    assert!(view.is_exhausted());
    assert!(view.items.is_empty());
    assert!(view.error.is_none());
    assert_eq!(view.total, 0);
}

#[tokio::test]
async fn controllers_share_one_cache() {
    let catalog = GatedCatalog::open(45);
    let cache = Arc::new(CatalogCache::new(catalog.clone(), options(), PAGE_SIZE));
    let first = FeedController::new(Arc::clone(&cache));
    let second = FeedController::new(Arc::clone(&cache));

    first.initialize(FilterKey::all(), None).await.unwrap();
    second.initialize(FilterKey::all(), None).await.unwrap();

    assert_eq!(catalog.started(), 1);
    assert_eq!(first.merged_items(), second.merged_items());
}
