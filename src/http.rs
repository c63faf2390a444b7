//! JSON surface over a shared [`CatalogCache`].
//!
//! Requires the `http` feature. Serves the first page a client renders
//! before its feed takes over, plus detail and category lookups.
//!
//! ## Routes
//!
//! - `GET /health`: `{ "ok": true, "cachedPages": n }`.
//! - `GET /products?category=&sortBy=&order=&search=&skip=`: one listing page;
//!   400 when `skip` is past the total.
//! - `GET /products/:id`: one product; 404 for unknown or non-numeric ids.
//! - `GET /categories`: every category.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::cache::CatalogCache;
use crate::catalog::ProductCatalog;
use crate::error::CatalogError;
use crate::model::{Category, FilterKey, FilterParams, Page, Product};

/// Query string of `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub category: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
    pub skip: Option<u64>,
}

impl ListingQuery {
    pub fn filter(&self) -> FilterKey {
        FilterKey::from(FilterParams {
            category: self.category.clone(),
            sort_by: self.sort_by.clone(),
            order: self.order.clone(),
            search: self.search.clone(),
        })
    }
}

/// Body of `GET /products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub products: Vec<Product>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
    /// Offset of the following page, absent on the last page.
    pub next_skip: Option<u64>,
    pub filter: FilterParams,
}

impl ListingResponse {
    pub fn new(filter: &FilterKey, page: Page) -> Self {
        let next_skip = (!page.is_last()).then(|| page.next_offset());
        Self {
            total: page.total,
            skip: page.offset,
            limit: page.page_size,
            next_skip,
            filter: filter.to_params(),
            products: page.items,
        }
    }

    /// Back to the page it was built from, e.g. to seed a feed.
    pub fn into_page(self) -> Page {
        Page::new(self.products, self.skip, self.limit, self.total)
    }
}

enum ApiError {
    Catalog(CatalogError),
    /// Product path segment that is not a catalog id.
    BadProductId(String),
    SkipPastEnd { skip: u64, total: u64 },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Catalog(err) => (
                StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                err.to_string(),
            ),
            ApiError::BadProductId(id) => {
                (StatusCode::NOT_FOUND, format!("no product with id {:?}", id))
            }
            ApiError::SkipPastEnd { skip, total } => (
                StatusCode::BAD_REQUEST,
                format!("skip {} is past the end of {} products", skip, total),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

/// Build an axum `Router` over the given cache.
pub fn router<C: ProductCatalog>(cache: Arc<CatalogCache<C>>) -> Router {
    Router::new()
        .route("/health", get(health_handler::<C>))
        .route("/products", get(listing_handler::<C>))
        .route("/products/:id", get(product_handler::<C>))
        .route("/categories", get(categories_handler::<C>))
        .with_state(cache)
}

/// Serve the cache over HTTP at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve<C: ProductCatalog>(
    cache: Arc<CatalogCache<C>>,
    addr: &str,
) -> Result<(), std::io::Error> {
    let app = router(cache);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "storefront listening");
    axum::serve(listener, app).await
}

async fn health_handler<C: ProductCatalog>(
    State(cache): State<Arc<CatalogCache<C>>>,
) -> impl IntoResponse {
    Json(json!({ "ok": true, "cachedPages": cache.cached_pages() }))
}

async fn listing_handler<C: ProductCatalog>(
    State(cache): State<Arc<CatalogCache<C>>>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ListingResponse>, ApiError> {
    let filter = query.filter();
    let page = cache.fetch_page(&filter, query.skip.unwrap_or(0)).await?;
    if page.offset > page.total {
        debug!(filter = %filter, skip = page.offset, total = page.total, "skip past the end");
        return Err(ApiError::SkipPastEnd {
            skip: page.offset,
            total: page.total,
        });
    }
    Ok(Json(ListingResponse::new(&filter, page)))
}

async fn product_handler<C: ProductCatalog>(
    State(cache): State<Arc<CatalogCache<C>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let Ok(parsed) = id.parse::<u64>() else {
        debug!(%id, "non-numeric product id");
        return Err(ApiError::BadProductId(id));
    };
    match cache.product(parsed).await {
        Ok(product) => Ok(Json(product)),
        Err(err) if err.is_not_found() => {
            debug!(id = parsed, "product not found");
            Err(err.into())
        }
        Err(err) => {
            warn!(id = parsed, error = %err, "product lookup failed");
            Err(err.into())
        }
    }
}

async fn categories_handler<C: ProductCatalog>(
    State(cache): State<Arc<CatalogCache<C>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(cache.categories().await?))
}
