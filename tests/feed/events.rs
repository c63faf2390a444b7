use std::sync::{Arc, Mutex};
use std::time::Duration;

use storefront_feed::{FeedEvent, FeedStatus, FilterKey};

use crate::support::{feed, wait_until, GatedCatalog};

fn recorder() -> (Arc<Mutex<Vec<FeedEvent>>>, impl Fn(FeedEvent) + Send + Sync + 'static) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |event: FeedEvent| sink.lock().unwrap().push(event))
}

/// Listeners run on their own threads; order by sequence before asserting.
fn sorted(events: &Mutex<Vec<FeedEvent>>) -> Vec<FeedEvent> {
    let mut events = events.lock().unwrap().clone();
    events.sort_by_key(|e| e.sequence);
    events
}

#[tokio::test]
async fn subscribers_see_every_transition() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);
    let (events, listener) = recorder();
    feed.subscribe(listener);

    feed.initialize(FilterKey::all(), None).await.unwrap();
    feed.request_next_page().await.unwrap();

    wait_until("four events", || events.lock().unwrap().len() == 4).await;
    let events = sorted(&events);
    let statuses: Vec<FeedStatus> = events.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            FeedStatus::Loading,
            FeedStatus::Ready,
            FeedStatus::LoadingMore,
            FeedStatus::Ready,
        ]
    );
    assert_eq!(events[3].item_count, 40);
    assert_eq!(events[3].page_count, 2);
    assert_eq!(events[3].total, Some(45));
    assert!(events.windows(2).all(|w| w[0].sequence < w[1].sequence));
}

#[tokio::test]
async fn error_events_carry_the_failure() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);
    let (events, listener) = recorder();
    feed.subscribe(listener);

    catalog.fail_next(storefront_feed::CatalogError::Network("reset".into()));
    assert!(feed.initialize(FilterKey::all(), None).await.is_err());

    wait_until("two events", || events.lock().unwrap().len() == 2).await;
    let last = sorted(&events).pop().unwrap();
    assert_eq!(last.status, FeedStatus::Error);
    assert!(last.error.unwrap().message.contains("reset"));
}

#[tokio::test]
async fn unsubscribed_listener_hears_nothing_more() {
    let catalog = GatedCatalog::open(45);
    let feed = feed(&catalog);
    let (events, listener) = recorder();
    let id = feed.subscribe(listener);

    feed.initialize(FilterKey::all(), None).await.unwrap();
    wait_until("two events", || events.lock().unwrap().len() == 2).await;

    assert!(feed.unsubscribe(&id));
    assert!(!feed.unsubscribe(&id));

    feed.request_next_page().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(events.lock().unwrap().len(), 2);
}
