//! Storefront data layer over a REST product catalog.
//!
//! A [`CatalogCache`] shared by reference deduplicates and memoizes catalog
//! requests; a [`FeedController`] turns it into an infinite-scroll session
//! per [`FilterKey`]; a [`ViewportTrigger`] asks the controller for more when
//! the sentinel scrolls into view.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod feed;
pub mod format;
pub mod model;
pub mod trigger;

#[cfg(feature = "http")]
pub mod http;

pub use cache::{CacheOptions, CacheStats, CatalogCache, QueryCache};
pub use catalog::{HttpCatalog, InMemoryCatalog, ProductCatalog};
pub use config::{ConfigError, StorefrontConfig};
pub use error::CatalogError;
pub use feed::{
    FeedController, FeedError, FeedErrorKind, FeedEvent, FeedSession, FeedStatus, FeedView,
    LoadOutcome, SubscriptionId,
};
pub use model::{
    Category, FilterKey, FilterParams, Page, PageRequest, Product, ProductCard, SortField,
    SortOrder,
};
pub use trigger::{SentinelGeometry, ViewportTrigger};
