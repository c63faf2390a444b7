use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::CatalogError;

/// Result slot shared by everyone waiting on one fetch.
type Outcome<V> = Option<Result<V, CatalogError>>;

/// Freshness, retention and retry policy for a [`QueryCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Values younger than this are served without touching the network.
    pub stale_time: Duration,
    /// Entries untouched for this long are evicted.
    pub gc_time: Duration,
    /// Extra attempts after a retryable failure.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(60),
            gc_time: Duration::from_secs(5 * 60),
            retries: 1,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl CacheOptions {
    pub fn with_stale_time(mut self, stale: Duration) -> Self {
        self.stale_time = stale;
        self
    }

    pub fn with_gc_time(mut self, gc: Duration) -> Self {
        self.gc_time = gc;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Counters describing how lookups were served.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Served a fresh value.
    pub hits: u64,
    /// Served a stale value (a background refresh was started or already running).
    pub stale_hits: u64,
    /// No value held; a fetch was started.
    pub misses: u64,
    /// No value held; joined a fetch already in flight.
    pub joined: u64,
    pub evicted: u64,
}

struct CacheEntry<V> {
    value: Option<V>,
    updated_at: Option<Instant>,
    last_access: Instant,
    inflight: Option<watch::Receiver<Outcome<V>>>,
}

impl<V> CacheEntry<V> {
    fn new(now: Instant) -> Self {
        Self {
            value: None,
            updated_at: None,
            last_access: now,
            inflight: None,
        }
    }

    fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        self.updated_at
            .map_or(false, |at| now.saturating_duration_since(at) < stale_time)
    }
}

struct Store<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    stats: CacheStats,
}

impl<K: Eq + Hash, V> Store<K, V> {
    fn evict_idle(&mut self, now: Instant, gc_time: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            entry.inflight.is_some() || now.saturating_duration_since(entry.last_access) < gc_time
        });
        let evicted = before - self.entries.len();
        self.stats.evicted += evicted as u64;
        evicted
    }
}

/// Process-local query cache with in-flight deduplication and
/// stale-while-revalidate reads.
///
/// Cloning is cheap and shares the underlying storage. Fetches run on
/// spawned tokio tasks, so a caller that gives up waiting never cancels the
/// request other callers are waiting on.
pub struct QueryCache<K, V> {
    store: Arc<Mutex<Store<K, V>>>,
    options: CacheOptions,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            options: self.options,
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(options: CacheOptions) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            })),
            options,
        }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Fetch `key` using the cache's default freshness threshold.
    pub async fn fetch<F, Fut>(&self, key: K, loader: F) -> Result<V, CatalogError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, CatalogError>> + Send + 'static,
    {
        self.fetch_with(key, self.options.stale_time, loader).await
    }

    /// Fetch `key`, running `loader` only when no usable value is held.
    ///
    /// - fresh value: returned immediately
    /// - stale value: returned immediately, refresh started in the background
    /// - no value: joins the in-flight fetch for `key` or starts one
    pub async fn fetch_with<F, Fut>(
        &self,
        key: K,
        stale_time: Duration,
        loader: F,
    ) -> Result<V, CatalogError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, CatalogError>> + Send + 'static,
    {
        let receiver = {
            let now = Instant::now();
            let mut guard = self.lock();
            let store = &mut *guard;
            store.evict_idle(now, self.options.gc_time);

            let entry = store
                .entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(now));
            entry.last_access = now;

            if let Some(value) = entry.value.clone() {
                if entry.is_fresh(now, stale_time) {
                    store.stats.hits += 1;
                    debug!(?key, "cache hit");
                } else {
                    store.stats.stale_hits += 1;
                    if entry.inflight.is_none() {
                        debug!(?key, "serving stale value, revalidating");
                        entry.inflight = Some(self.spawn_fetch(key, loader));
                    }
                }
                return Ok(value);
            }

            match &entry.inflight {
                Some(receiver) => {
                    store.stats.joined += 1;
                    debug!(?key, "joining in-flight fetch");
                    receiver.clone()
                }
                None => {
                    store.stats.misses += 1;
                    debug!(?key, "cache miss");
                    let receiver = self.spawn_fetch(key, loader);
                    entry.inflight = Some(receiver.clone());
                    receiver
                }
            }
        };

        wait_for_outcome(receiver).await
    }

    /// Current value for `key`, fresh or not, without fetching.
    pub fn peek(&self, key: &K) -> Option<V> {
        let mut store = self.lock();
        let entry = store.entries.get_mut(key)?;
        entry.last_access = Instant::now();
        entry.value.clone()
    }

    /// Store `value` as freshly fetched.
    pub fn insert(&self, key: K, value: V) {
        let now = Instant::now();
        let mut store = self.lock();
        let entry = store
            .entries
            .entry(key)
            .or_insert_with(|| CacheEntry::new(now));
        entry.value = Some(value);
        entry.updated_at = Some(now);
        entry.last_access = now;
    }

    /// Mark `key` stale so the next read revalidates. Returns whether it was held.
    pub fn invalidate(&self, key: &K) -> bool {
        match self.lock().entries.get_mut(key) {
            Some(entry) => {
                entry.updated_at = None;
                true
            }
            None => false,
        }
    }

    /// Drop the value held for `key`. Returns whether anything was held.
    ///
    /// An entry with a fetch in flight keeps its slot so later readers join
    /// that fetch; its result lands once it completes.
    pub fn remove(&self, key: &K) -> bool {
        let mut store = self.lock();
        let fetching = match store.entries.get_mut(key) {
            Some(entry) if entry.inflight.is_some() => {
                entry.value = None;
                entry.updated_at = None;
                true
            }
            Some(_) => false,
            None => return false,
        };
        if !fetching {
            store.entries.remove(key);
        }
        true
    }

    pub fn is_fetching(&self, key: &K) -> bool {
        self.lock()
            .entries
            .get(key)
            .map_or(false, |entry| entry.inflight.is_some())
    }

    /// Evict entries idle for longer than the retention threshold.
    pub fn evict_idle(&self) -> usize {
        let evicted = self.lock().evict_idle(Instant::now(), self.options.gc_time);
        if evicted > 0 {
            debug!(evicted, "evicted idle cache entries");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Drop every held value. Entries with a fetch in flight keep their
    /// slot, as in [`remove`](Self::remove).
    pub fn clear(&self) {
        self.lock().entries.retain(|_, entry| {
            entry.value = None;
            entry.updated_at = None;
            entry.inflight.is_some()
        });
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, Store<K, V>> {
        lock_store(&self.store)
    }

    fn spawn_fetch<F, Fut>(&self, key: K, loader: F) -> watch::Receiver<Outcome<V>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, CatalogError>> + Send + 'static,
    {
        let (sender, receiver) = watch::channel(None);
        let store = Arc::clone(&self.store);
        let options = self.options;

        tokio::spawn(async move {
            let result = load_with_retry(&loader, options.retries, options.retry_delay).await;
            {
                let mut store = lock_store(&store);
                if let Some(entry) = store.entries.get_mut(&key) {
                    entry.inflight = None;
                    match &result {
                        Ok(value) => {
                            entry.value = Some(value.clone());
                            entry.updated_at = Some(Instant::now());
                        }
                        Err(err) => {
                            warn!(?key, error = %err, stale_kept = entry.value.is_some(), "cache fetch failed");
                        }
                    }
                }
            }
            // Receivers may all be gone; the value was stored above regardless.
            let _ = sender.send(Some(result));
        });

        receiver
    }
}

fn lock_store<K, V>(store: &Mutex<Store<K, V>>) -> MutexGuard<'_, Store<K, V>> {
    // Entries stay consistent across a panicking holder; keep serving.
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn load_with_retry<V, F, Fut>(
    loader: &F,
    retries: u32,
    delay: Duration,
) -> Result<V, CatalogError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<V, CatalogError>>,
{
    let mut attempt = 0;
    loop {
        match loader().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retries && err.is_retryable() => {
                attempt += 1;
                warn!(attempt, error = %err, "retrying catalog fetch");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(err) => return Err(err),
        }
    }
}

async fn wait_for_outcome<V: Clone>(
    mut receiver: watch::Receiver<Outcome<V>>,
) -> Result<V, CatalogError> {
    let aborted = || CatalogError::Network("fetch task ended without a result".into());
    let outcome = receiver
        .wait_for(Option::is_some)
        .await
        .map_err(|_| aborted())?;
    match &*outcome {
        Some(result) => result.clone(),
        None => Err(aborted()),
    }
}
