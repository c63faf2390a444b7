use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "emitter")]
use std::sync::{Mutex, PoisonError};

#[cfg(feature = "emitter")]
use event_emitter_rs::EventEmitter;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state::{FeedError, FeedSession, FeedStatus};
use crate::model::FilterKey;

/// Event name every feed state change is emitted under.
pub const FEED_CHANGED: &str = "feed.changed";

/// Snapshot of a feed after a state transition.
///
/// Carries counts rather than items; call
/// [`FeedController::view`](super::FeedController::view) for the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
    /// Strictly increasing per controller, in transition order.
    pub sequence: u64,
    pub filter: FilterKey,
    pub status: FeedStatus,
    pub page_count: usize,
    pub item_count: usize,
    pub total: Option<u64>,
    pub error: Option<FeedError>,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(String);

pub(crate) struct FeedNotifier {
    sequence: AtomicU64,
    #[cfg(feature = "emitter")]
    emitter: Mutex<EventEmitter>,
}

impl FeedNotifier {
    pub(crate) fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
            #[cfg(feature = "emitter")]
            emitter: Mutex::new(EventEmitter::new()),
        }
    }

    /// Build the event for `session`. Call while holding the state lock so
    /// sequence numbers follow transition order.
    pub(crate) fn snapshot(&self, session: &FeedSession) -> FeedEvent {
        FeedEvent {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            filter: session.key().clone(),
            status: session.status(),
            page_count: session.pages().len(),
            item_count: session.item_count(),
            total: session.total(),
            error: session.error().cloned(),
        }
    }

    pub(crate) fn notify(&self, event: FeedEvent) {
        debug!(
            sequence = event.sequence,
            filter = %event.filter,
            status = ?event.status,
            items = event.item_count,
            "feed changed"
        );

        #[cfg(feature = "emitter")]
        {
            let mut emitter = self.emitter.lock().unwrap_or_else(PoisonError::into_inner);
            let _listeners = emitter.emit(FEED_CHANGED, event);
        }
    }

    #[cfg(feature = "emitter")]
    pub(crate) fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(FeedEvent) + Send + Sync + 'static,
    {
        let mut emitter = self.emitter.lock().unwrap_or_else(PoisonError::into_inner);
        SubscriptionId(emitter.on(FEED_CHANGED, listener))
    }

    #[cfg(feature = "emitter")]
    pub(crate) fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        let mut emitter = self.emitter.lock().unwrap_or_else(PoisonError::into_inner);
        emitter.remove_listener(&id.0).is_some()
    }
}
