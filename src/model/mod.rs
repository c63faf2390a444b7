//! Catalog data types: products, categories, filter keys and pages.

mod filter;
mod page;
mod product;

pub use filter::{FilterKey, FilterParams, SortField, SortOrder, UnknownValue, ALL_CATEGORIES};
pub use page::{Page, PageRequest};
pub use product::{
    AvailabilityStatus, Category, Product, ProductCard, ProductReview, ProductsResponse,
};
