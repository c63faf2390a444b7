//! Catalog clients.
//!
//! `ProductCatalog` is the seam between the cache and whatever serves
//! products. `HttpCatalog` talks to a DummyJSON-shaped REST API;
//! `InMemoryCatalog` answers from a fixed product list and is used for tests
//! and offline development.

mod http;
mod in_memory;

use std::future::Future;

use crate::error::CatalogError;
use crate::model::{Category, PageRequest, Product, ProductsResponse};

pub use http::HttpCatalog;
pub use in_memory::InMemoryCatalog;

/// Read access to a remote product catalog.
pub trait ProductCatalog: Send + Sync + 'static {
    /// One listing page for the request's filter and window.
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = Result<ProductsResponse, CatalogError>> + Send;

    /// A single product; `CatalogError::NotFound` when the id is unknown.
    fn fetch_product(&self, id: u64) -> impl Future<Output = Result<Product, CatalogError>> + Send;

    fn fetch_categories(&self) -> impl Future<Output = Result<Vec<Category>, CatalogError>> + Send;
}
