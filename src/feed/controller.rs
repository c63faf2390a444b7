use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::events::{FeedEvent, FeedNotifier};
#[cfg(feature = "emitter")]
use super::events::SubscriptionId;
use super::state::{FeedError, FeedSession, FeedStatus, FeedView, LoadOutcome};
use crate::cache::CatalogCache;
use crate::catalog::ProductCatalog;
use crate::error::CatalogError;
use crate::model::{FilterKey, Page, Product};

/// Which fetch a ticket stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Initial,
    NextPage,
}

/// Identity of one outstanding fetch. A result is applied only if the
/// session it was issued for is still the current one and still waits for
/// exactly this offset.
#[derive(Debug, Clone)]
struct FetchTicket {
    generation: u64,
    key: FilterKey,
    offset: u64,
    kind: FetchKind,
}

struct FeedState {
    session: FeedSession,
    generation: u64,
}

impl FeedState {
    fn accepts(&self, ticket: &FetchTicket) -> bool {
        let expected = match ticket.kind {
            FetchKind::Initial => FeedStatus::Loading,
            FetchKind::NextPage => FeedStatus::LoadingMore,
        };
        ticket.generation == self.generation
            && &ticket.key == self.session.key()
            && ticket.offset == self.session.next_offset()
            && self.session.status() == expected
    }

    fn ticket(&self, kind: FetchKind) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            key: self.session.key().clone(),
            offset: self.session.next_offset(),
            kind,
        }
    }
}

/// Infinite-scroll session over a shared [`CatalogCache`].
///
/// Every state transition happens under a short synchronous lock that is
/// never held across a fetch, so a controller can be shared as
/// `Arc<FeedController<C>>` between the scroll trigger, filter controls and
/// renderers. At most one fetch is outstanding per session; a filter change
/// starts a new session and any fetch issued for the old one is dropped when
/// it resolves.
pub struct FeedController<C> {
    cache: Arc<CatalogCache<C>>,
    state: Mutex<FeedState>,
    notifier: FeedNotifier,
}

impl<C: ProductCatalog> FeedController<C> {
    pub fn new(cache: Arc<CatalogCache<C>>) -> Self {
        Self {
            cache,
            state: Mutex::new(FeedState {
                session: FeedSession::new(FilterKey::all()),
                generation: 0,
            }),
            notifier: FeedNotifier::new(),
        }
    }

    pub fn cache(&self) -> &Arc<CatalogCache<C>> {
        &self.cache
    }

    /// Start a session for `key`.
    ///
    /// With a seed page (e.g. one rendered on the server) the session starts
    /// from it without a fetch, and the page is stored in the shared cache.
    /// Without one, the first page is fetched.
    pub async fn initialize(
        &self,
        key: FilterKey,
        seed: Option<Page>,
    ) -> Result<LoadOutcome, FeedError> {
        match seed {
            Some(page) => {
                info!(filter = %key, items = page.len(), "feed seeded");
                self.cache.seed_page(&key, page.clone());
                self.replace_session(FeedSession::seeded(key, page));
                Ok(LoadOutcome::Loaded)
            }
            None => {
                let ticket = self.replace_session(FeedSession::loading(key));
                self.run(ticket).await
            }
        }
    }

    /// Fetch the page after the last one held.
    ///
    /// Skipped unless the session is `Ready` with more items remaining,
    /// which makes concurrent calls collapse into a single fetch.
    pub async fn request_next_page(&self) -> Result<LoadOutcome, FeedError> {
        let (ticket, event) = {
            let mut state = self.lock();
            let status = state.session.status();
            if status != FeedStatus::Ready || !state.session.has_more() {
                debug!(?status, "next page skipped");
                return Ok(LoadOutcome::Skipped);
            }
            state.session.set_status(FeedStatus::LoadingMore);
            let event = self.notifier.snapshot(&state.session);
            (state.ticket(FetchKind::NextPage), event)
        };
        self.notifier.notify(event);
        self.run(ticket).await
    }

    /// Alias of [`request_next_page`](Self::request_next_page) for "load
    /// more" buttons.
    pub async fn load_more(&self) -> Result<LoadOutcome, FeedError> {
        self.request_next_page().await
    }

    /// Replace the session with a fresh one for `key`.
    ///
    /// Items are cleared and the status set to `Loading` before this method
    /// first yields. A change to the key the feed already shows is skipped.
    pub async fn change_filter(&self, key: FilterKey) -> Result<LoadOutcome, FeedError> {
        {
            let state = self.lock();
            if state.session.key() == &key && state.session.status() != FeedStatus::Idle {
                debug!(filter = %key, "filter unchanged");
                return Ok(LoadOutcome::Skipped);
            }
        }
        info!(filter = %key, "filter changed");
        let ticket = self.replace_session(FeedSession::loading(key));
        self.run(ticket).await
    }

    /// Re-issue the fetch that failed. Only acts in the `Error` state.
    pub async fn retry(&self) -> Result<LoadOutcome, FeedError> {
        let (ticket, event) = {
            let mut state = self.lock();
            if state.session.status() != FeedStatus::Error {
                return Ok(LoadOutcome::Skipped);
            }
            let kind = if state.session.pages().is_empty() {
                FetchKind::Initial
            } else if state.session.has_more() {
                FetchKind::NextPage
            } else {
                state.session.set_status(FeedStatus::Exhausted);
                let event = self.notifier.snapshot(&state.session);
                drop(state);
                self.notifier.notify(event);
                return Ok(LoadOutcome::Skipped);
            };
            state.session.set_status(match kind {
                FetchKind::Initial => FeedStatus::Loading,
                FetchKind::NextPage => FeedStatus::LoadingMore,
            });
            let event = self.notifier.snapshot(&state.session);
            (state.ticket(kind), event)
        };
        self.notifier.notify(event);
        self.run(ticket).await
    }

    /// End the session. Outstanding fetches are dropped when they resolve.
    pub fn close(&self) {
        let key = self.key();
        self.replace_session(FeedSession::new(key));
    }

    pub fn status(&self) -> FeedStatus {
        self.lock().session.status()
    }

    pub fn key(&self) -> FilterKey {
        self.lock().session.key().clone()
    }

    pub fn total(&self) -> Option<u64> {
        self.lock().session.total()
    }

    pub fn is_exhausted(&self) -> bool {
        self.status() == FeedStatus::Exhausted
    }

    pub fn merged_items(&self) -> Vec<Product> {
        self.lock().session.merged_items()
    }

    /// Copy of the current session.
    pub fn session(&self) -> FeedSession {
        self.lock().session.clone()
    }

    pub fn view(&self) -> FeedView {
        FeedView::from_session(&self.lock().session)
    }

    /// Call `listener` after every state change. Listeners run on the
    /// emitter's own threads, so ordering across events is only recoverable
    /// through [`FeedEvent::sequence`].
    #[cfg(feature = "emitter")]
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(FeedEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    #[cfg(feature = "emitter")]
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace_session(&self, session: FeedSession) -> FetchTicket {
        let (ticket, event) = {
            let mut state = self.lock();
            state.generation += 1;
            state.session = session;
            let event = self.notifier.snapshot(&state.session);
            (state.ticket(FetchKind::Initial), event)
        };
        self.notifier.notify(event);
        ticket
    }

    async fn run(&self, ticket: FetchTicket) -> Result<LoadOutcome, FeedError> {
        let result = self.cache.fetch_page(&ticket.key, ticket.offset).await;
        self.finish(ticket, result)
    }

    fn finish(
        &self,
        ticket: FetchTicket,
        result: Result<Page, CatalogError>,
    ) -> Result<LoadOutcome, FeedError> {
        let (outcome, event): (Result<LoadOutcome, FeedError>, FeedEvent) = {
            let mut state = self.lock();
            if !state.accepts(&ticket) {
                debug!(
                    filter = %ticket.key,
                    offset = ticket.offset,
                    "discarding result for a replaced session"
                );
                return Ok(LoadOutcome::Discarded);
            }

            let outcome = match result {
                Ok(page) => {
                    state.session.apply_page(page);
                    Ok(LoadOutcome::Loaded)
                }
                Err(err) => {
                    warn!(filter = %ticket.key, offset = ticket.offset, error = %err, "feed fetch failed");
                    let error = FeedError::from(&err);
                    state.session.fail(error.clone());
                    Err(error)
                }
            };
            (outcome, self.notifier.snapshot(&state.session))
        };
        self.notifier.notify(event);
        outcome
    }
}
