use std::cmp::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

use super::ProductCatalog;
use crate::error::CatalogError;
use crate::model::{Category, PageRequest, Product, ProductsResponse, SortField, SortOrder};

/// Catalog backed by a fixed product list.
///
/// Applies category, search, sort and window the way the remote catalog
/// does, and records every listing request so tests can count round-trips.
/// Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<Vec<Product>>,
    categories: Arc<Vec<Category>>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl InMemoryCatalog {
    /// Categories are derived from the products' category slugs.
    pub fn new(products: Vec<Product>) -> Self {
        let mut slugs: Vec<&str> = products.iter().map(|p| p.category.as_str()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        let categories = slugs
            .into_iter()
            .filter(|slug| !slug.is_empty())
            .map(Category::new)
            .collect();

        Self {
            products: Arc::new(products),
            categories: Arc::new(categories),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `count` products with ids `1..=count`, spread over three categories.
    pub fn generated(count: u64) -> Self {
        const CATEGORIES: [&str; 3] = ["beauty", "fragrances", "furniture"];
        let products = (1..=count)
            .map(|id| {
                Product::new(id, format!("Product {:03}", id), id as f64 * 1.5)
                    .with_category(CATEGORIES[(id % 3) as usize])
                    .with_rating((id % 50) as f64 / 10.0)
            })
            .collect();
        Self::new(products)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Listing requests received so far, in order.
    pub fn page_requests(&self) -> Vec<PageRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn listing(&self, request: &PageRequest) -> ProductsResponse {
        let filter = &request.filter;
        // A search term overrides the category, as on the remote catalog.
        let category = filter.search().map_or(filter.category(), |_| None);
        let mut matching: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .filter(|p| filter.search().map_or(true, |term| matches_search(p, term)))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = compare(a, b, filter.sort_field()).then_with(|| a.id.cmp(&b.id));
            match filter.sort_order() {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let skip = request.offset.min(total) as usize;
        // The remote catalog treats a zero limit as "everything".
        let take = if request.limit == 0 {
            matching.len()
        } else {
            request.limit as usize
        };

        ProductsResponse {
            products: matching.into_iter().skip(skip).take(take).cloned().collect(),
            total,
            skip: request.offset,
            limit: request.limit,
        }
    }
}

impl ProductCatalog for InMemoryCatalog {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ProductsResponse, CatalogError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(self.listing(request))
    }

    async fn fetch_product(&self, id: u64) -> Result<Product, CatalogError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.categories.as_ref().clone())
    }
}

fn matches_search(product: &Product, term: &str) -> bool {
    let term = term.to_lowercase();
    product.title.to_lowercase().contains(&term)
        || product.description.to_lowercase().contains(&term)
}

fn compare(a: &Product, b: &Product, field: SortField) -> Ordering {
    match field {
        SortField::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
        SortField::Rating => a.rating.partial_cmp(&b.rating).unwrap_or(Ordering::Equal),
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    }
}
