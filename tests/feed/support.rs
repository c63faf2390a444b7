//! Test catalog whose fetches can be held open and made to fail.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use storefront_feed::{
    CacheOptions, CatalogCache, CatalogError, Category, FeedController, InMemoryCatalog,
    PageRequest, Product, ProductCatalog,
};
use storefront_feed::model::ProductsResponse;
use tokio::sync::Semaphore;
use tokio::time::Instant;

pub const PAGE_SIZE: u64 = 20;

/// Wraps an `InMemoryCatalog`. When gated, every listing fetch waits for a
/// permit handed out by [`GatedCatalog::release`].
#[derive(Clone)]
pub struct GatedCatalog {
    inner: InMemoryCatalog,
    gate: Option<Arc<Semaphore>>,
    started: Arc<AtomicUsize>,
    failures: Arc<Mutex<VecDeque<CatalogError>>>,
}

impl GatedCatalog {
    pub fn open(products: u64) -> Self {
        Self {
            inner: InMemoryCatalog::generated(products),
            gate: None,
            started: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn gated(products: u64) -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::open(products)
        }
    }

    /// Let `n` held fetches through, oldest first.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// The next listing fetch fails with `err`.
    pub fn fail_next(&self, err: CatalogError) {
        self.failures.lock().unwrap().push_back(err);
    }

    /// Listing fetches started so far, held ones included.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &InMemoryCatalog {
        &self.inner
    }
}

impl ProductCatalog for GatedCatalog {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ProductsResponse, CatalogError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        let failure = self.failures.lock().unwrap().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }
        self.inner.fetch_page(request).await
    }

    async fn fetch_product(&self, id: u64) -> Result<Product, CatalogError> {
        self.inner.fetch_product(id).await
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.inner.fetch_categories().await
    }
}

/// Cache without built-in retries so failures surface on the first attempt.
pub fn options() -> CacheOptions {
    CacheOptions::default()
        .with_retries(0)
        .with_retry_delay(Duration::ZERO)
}

pub fn feed(catalog: &GatedCatalog) -> Arc<FeedController<GatedCatalog>> {
    let cache = CatalogCache::new(catalog.clone(), options(), PAGE_SIZE);
    Arc::new(FeedController::new(Arc::new(cache)))
}

pub fn ids(items: &[Product]) -> Vec<u64> {
    items.iter().map(|p| p.id).collect()
}

/// Poll `condition` until it holds; panics after five seconds.
pub async fn wait_until<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
