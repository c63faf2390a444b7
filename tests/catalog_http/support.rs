//! A DummyJSON-shaped catalog served by axum on an ephemeral port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use storefront_feed::{FilterKey, HttpCatalog, InMemoryCatalog, PageRequest, ProductCatalog};

#[derive(Clone)]
pub struct FakeCatalog {
    catalog: InMemoryCatalog,
    hits: Arc<AtomicUsize>,
}

impl FakeCatalog {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

type Params = Query<HashMap<String, String>>;

fn request(params: &HashMap<String, String>, category: Option<&str>) -> PageRequest {
    let number = |name: &str, default: u64| {
        params
            .get(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    };
    let mut filter = FilterKey::all();
    if let Some(category) = category {
        filter = filter.with_category(category);
    }
    if let Some(term) = params.get("q") {
        filter = filter.with_search(term);
    }
    let sort_field = params
        .get("sortBy")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    let sort_order = params
        .get("order")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    PageRequest::new(
        filter.with_sort(sort_field, sort_order),
        number("skip", 0),
        number("limit", 30),
    )
}

async fn list(State(fake): State<FakeCatalog>, Query(params): Params) -> Response {
    fake.hits.fetch_add(1, Ordering::SeqCst);
    Json(fake.catalog.listing(&request(&params, None))).into_response()
}

async fn by_category(
    State(fake): State<FakeCatalog>,
    Path(slug): Path<String>,
    Query(params): Params,
) -> Response {
    fake.hits.fetch_add(1, Ordering::SeqCst);
    Json(fake.catalog.listing(&request(&params, Some(&slug)))).into_response()
}

async fn categories(State(fake): State<FakeCatalog>) -> Response {
    fake.hits.fetch_add(1, Ordering::SeqCst);
    Json(fake.catalog.fetch_categories().await.unwrap()).into_response()
}

async fn product(State(fake): State<FakeCatalog>, Path(id): Path<String>) -> Response {
    fake.hits.fetch_add(1, Ordering::SeqCst);
    let found = match id.parse::<u64>() {
        Ok(id) => fake.catalog.fetch_product(id).await.ok(),
        Err(_) => None,
    };
    match found {
        Some(product) => Json(product).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("Product with id '{}' not found", id) })),
        )
            .into_response(),
    }
}

async fn bind(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Serve `products` generated products; returns the base URL and a handle.
pub async fn start_fake(products: u64) -> (String, FakeCatalog) {
    let fake = FakeCatalog {
        catalog: InMemoryCatalog::generated(products),
        hits: Arc::new(AtomicUsize::new(0)),
    };
    let app = Router::new()
        .route("/products", get(list))
        .route("/products/search", get(list))
        .route("/products/categories", get(categories))
        .route("/products/category/:slug", get(by_category))
        .route("/products/:id", get(product))
        .with_state(fake.clone());
    (bind(app).await, fake)
}

/// Every route answers `status` with a plain-text body; counts requests.
pub async fn start_failing(status: StatusCode) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().fallback(move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (status, "upstream unavailable")
        }
    });
    (bind(app).await, hits)
}

/// Every route answers 200 with `body`, optionally after `delay`.
pub async fn start_raw(body: &'static str, delay: Duration) -> String {
    let app = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        body
    });
    bind(app).await
}

pub fn client(base: &str) -> HttpCatalog {
    HttpCatalog::new(base, Duration::from_secs(10)).unwrap()
}
