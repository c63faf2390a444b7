//! Cache layer shared by every feed and handler in the process.
//!
//! [`QueryCache`] is the generic engine: at most one in-flight fetch per key,
//! stale-while-revalidate reads, one retry for transient failures, idle
//! eviction. [`CatalogCache`] wraps three of them (listing pages, products,
//! categories) behind typed accessors.

mod catalog_cache;
mod query_cache;

pub use catalog_cache::CatalogCache;
pub use query_cache::{CacheOptions, CacheStats, QueryCache};
