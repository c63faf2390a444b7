use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::format::{
    calculate_discounted_price, capitalize_words, format_discount, format_price, format_rating,
};

/// Products discounted by this percentage or less get no badge.
const DISCOUNT_BADGE_THRESHOLD: f64 = 5.0;

/// Stock availability as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AvailabilityStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AvailabilityStatus::InStock => "In Stock",
            AvailabilityStatus::LowStock => "Low Stock",
            AvailabilityStatus::OutOfStock => "Out of Stock",
            AvailabilityStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReview {
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewer_email: String,
}

/// A catalog product.
///
/// Only `id` is interpreted by the feed; everything else is carried through
/// for presentation. Upstream fields without a typed counterpart land in
/// `extra` and are serialized back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub discount_percentage: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub stock: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub availability_status: AvailabilityStatus,
    #[serde(default)]
    pub reviews: Vec<ProductReview>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Minimal product, mostly useful for fixtures.
    pub fn new(id: u64, title: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            category: String::new(),
            price,
            discount_percentage: 0.0,
            rating: 0.0,
            stock: 0,
            tags: Vec::new(),
            brand: None,
            sku: None,
            thumbnail: String::new(),
            images: Vec::new(),
            availability_status: AvailabilityStatus::Unknown,
            reviews: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_discount(mut self, percentage: f64) -> Self {
        self.discount_percentage = percentage;
        self
    }

    pub fn discounted_price(&self) -> f64 {
        calculate_discounted_price(self.price, self.discount_percentage)
    }

    pub fn shows_discount_badge(&self) -> bool {
        self.discount_percentage > DISCOUNT_BADGE_THRESHOLD
    }

    /// Display projection used by listing and detail renderers.
    pub fn card(&self) -> ProductCard {
        let badge = self.shows_discount_badge();
        ProductCard {
            id: self.id,
            title: self.title.clone(),
            category_label: capitalize_words(&self.category),
            thumbnail: self.thumbnail.clone(),
            price: format_price(self.discounted_price(), "USD"),
            original_price: badge.then(|| format_price(self.price, "USD")),
            discount_badge: badge.then(|| format_discount(self.discount_percentage)),
            rating: format_rating(self.rating),
            review_count: self.reviews.len(),
            availability: self.availability_status.label(),
        }
    }
}

/// Pre-formatted values for a product tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub id: u64,
    pub title: String,
    pub category_label: String,
    pub thumbnail: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount_badge: Option<String>,
    pub rating: String,
    pub review_count: usize,
    pub availability: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl Category {
    pub fn new(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            name: capitalize_words(&slug),
            url: format!("/products/category/{}", slug),
            slug,
        }
    }
}

/// Wire shape of every listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}
