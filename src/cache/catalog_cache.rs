use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::{CacheOptions, CacheStats, QueryCache};
use crate::catalog::ProductCatalog;
use crate::config::StorefrontConfig;
use crate::error::CatalogError;
use crate::model::{Category, FilterKey, Page, PageRequest, Product};

/// Typed cache facade over a [`ProductCatalog`].
///
/// One instance is built per process and shared by reference
/// (`Arc<CatalogCache<C>>`) with every feed and handler that needs catalog
/// data. Listing pages are keyed by `(filter, offset, page_size)`.
pub struct CatalogCache<C> {
    catalog: Arc<C>,
    pages: QueryCache<PageRequest, Page>,
    products: QueryCache<u64, Product>,
    categories: QueryCache<(), Vec<Category>>,
    page_size: u64,
    search_stale_time: Duration,
    categories_stale_time: Duration,
}

impl<C: ProductCatalog> CatalogCache<C> {
    pub fn new(catalog: C, options: CacheOptions, page_size: u64) -> Self {
        Self {
            catalog: Arc::new(catalog),
            pages: QueryCache::new(options),
            products: QueryCache::new(options),
            categories: QueryCache::new(options),
            page_size: page_size.max(1),
            search_stale_time: Duration::from_secs(30),
            categories_stale_time: Duration::from_secs(5 * 60),
        }
    }

    pub fn from_config(catalog: C, config: &StorefrontConfig) -> Self {
        Self::new(catalog, config.cache_options(), config.page_size)
            .with_search_stale_time(config.search_stale_time)
            .with_categories_stale_time(config.categories_stale_time)
    }

    pub fn with_search_stale_time(mut self, stale: Duration) -> Self {
        self.search_stale_time = stale;
        self
    }

    pub fn with_categories_stale_time(mut self, stale: Duration) -> Self {
        self.categories_stale_time = stale;
        self
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// The page of `key` starting at `offset`.
    pub async fn fetch_page(&self, key: &FilterKey, offset: u64) -> Result<Page, CatalogError> {
        let request = PageRequest::new(key.clone(), offset, self.page_size);
        let stale_time = if key.search().is_some() {
            self.search_stale_time
        } else {
            self.pages.options().stale_time
        };

        let catalog = Arc::clone(&self.catalog);
        let loader_request = request.clone();
        self.pages
            .fetch_with(request, stale_time, move || {
                let catalog = Arc::clone(&catalog);
                let request = loader_request.clone();
                async move {
                    info!(filter = %request.filter, offset = request.offset, "fetching listing page");
                    let response = catalog.fetch_page(&request).await?;
                    Ok(Page::from_response(response, request.offset, request.limit))
                }
            })
            .await
    }

    /// Store a page that was fetched elsewhere, e.g. rendered on the server.
    pub fn seed_page(&self, key: &FilterKey, page: Page) {
        let request = PageRequest::new(key.clone(), page.offset, page.page_size);
        self.pages.insert(request, page);
    }

    pub fn cached_page(&self, key: &FilterKey, offset: u64) -> Option<Page> {
        self.pages
            .peek(&PageRequest::new(key.clone(), offset, self.page_size))
    }

    pub async fn product(&self, id: u64) -> Result<Product, CatalogError> {
        let catalog = Arc::clone(&self.catalog);
        self.products
            .fetch(id, move || {
                let catalog = Arc::clone(&catalog);
                async move { catalog.fetch_product(id).await }
            })
            .await
    }

    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        let catalog = Arc::clone(&self.catalog);
        self.categories
            .fetch_with((), self.categories_stale_time, move || {
                let catalog = Arc::clone(&catalog);
                async move { catalog.fetch_categories().await }
            })
            .await
    }

    /// Evict idle entries from every underlying cache.
    pub fn evict_idle(&self) -> usize {
        self.pages.evict_idle() + self.products.evict_idle() + self.categories.evict_idle()
    }

    pub fn clear(&self) {
        self.pages.clear();
        self.products.clear();
        self.categories.clear();
    }

    pub fn page_stats(&self) -> CacheStats {
        self.pages.stats()
    }

    pub fn category_stats(&self) -> CacheStats {
        self.categories.stats()
    }

    pub fn cached_pages(&self) -> usize {
        self.pages.len()
    }
}
