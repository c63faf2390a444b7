use tokio::runtime::Handle;

use storefront_feed::{FilterKey, SentinelGeometry, ViewportTrigger};

use crate::support::{feed, wait_until, GatedCatalog};

#[tokio::test]
async fn sentinel_pulls_pages_until_exhausted() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);
    feed.initialize(FilterKey::all(), None).await.unwrap();

    let mut trigger = ViewportTrigger::for_feed(feed.clone(), Handle::current());

    assert!(trigger.observe(true));
    wait_until("second page", || feed.merged_items().len() == 40).await;

    // Still visible: no new edge, no new page.
    assert!(!trigger.observe(true));

    assert!(!trigger.observe(false));
    assert!(trigger.observe(true));
    wait_until("last page", || feed.is_exhausted()).await;
    assert_eq!(feed.merged_items().len(), 45);

    // Further edges reach the controller, which refuses them.
    trigger.observe(false);
    trigger.observe(true);
    tokio::task::yield_now().await;
    assert_eq!(catalog.started(), 3);
}

#[tokio::test]
async fn detached_trigger_stops_loading() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);
    feed.initialize(FilterKey::all(), None).await.unwrap();

    let mut trigger = ViewportTrigger::for_feed(feed.clone(), Handle::current());
    trigger.detach();

    let near_bottom = SentinelGeometry {
        sentinel_top: 950.0,
        sentinel_bottom: 951.0,
        viewport_top: 0.0,
        viewport_bottom: 900.0,
    };
    assert!(!trigger.observe_geometry(&near_bottom));
    tokio::task::yield_now().await;
    assert_eq!(feed.merged_items().len(), 20);
    assert_eq!(catalog.started(), 1);
}
