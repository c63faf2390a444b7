use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ProductCatalog;
use crate::config::{ConfigError, StorefrontConfig};
use crate::error::CatalogError;
use crate::model::{Category, PageRequest, Product, ProductsResponse};

/// REST client for a DummyJSON-shaped product catalog.
///
/// Routing follows the catalog's endpoints: a search term selects
/// `/products/search`, otherwise a category selects
/// `/products/category/{slug}`, otherwise `/products`.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: Url,
}

impl HttpCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::Invalid {
            field: "catalog_url",
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                field: "catalog_url",
                reason: format!("{} cannot carry a path", base_url),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("storefront_feed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Invalid {
                field: "request_timeout",
                reason: e.to_string(),
            })?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &StorefrontConfig) -> Result<Self, ConfigError> {
        Self::new(&config.catalog_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL for a listing request, query parameters included.
    pub fn listing_url(&self, request: &PageRequest) -> Url {
        let filter = &request.filter;
        let mut url = match (filter.search(), filter.category()) {
            (Some(_), _) => self.endpoint(&["products", "search"]),
            (None, Some(category)) => self.endpoint(&["products", "category", category]),
            (None, None) => self.endpoint(&["products"]),
        };

        {
            let mut query = url.query_pairs_mut();
            if let Some(term) = filter.search() {
                query.append_pair("q", term);
            }
            query
                .append_pair("limit", &request.limit.to_string())
                .append_pair("skip", &request.offset.to_string())
                .append_pair("sortBy", filter.sort_field().as_str())
                .append_pair("order", filter.sort_order().as_str());
        }
        url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        debug!(%url, "GET");
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(%url, error = %e, "catalog request failed");
            CatalogError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            warn!(%url, status = status.as_u16(), "catalog returned an error status");
            return Err(CatalogError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(CatalogError::from)
    }
}

impl ProductCatalog for HttpCatalog {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ProductsResponse, CatalogError> {
        self.get_json(self.listing_url(request)).await
    }

    async fn fetch_product(&self, id: u64) -> Result<Product, CatalogError> {
        let segment = id.to_string();
        let url = self.endpoint(&["products", segment.as_str()]);
        match self.get_json(url).await {
            Err(CatalogError::Remote { status: 404, .. }) => Err(CatalogError::NotFound(id)),
            other => other,
        }
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.get_json(self.endpoint(&["products", "categories"]))
            .await
    }
}
