use serde::{Deserialize, Serialize};

use super::{FilterKey, Product, ProductsResponse};

/// One fetched batch of products plus its position in the result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Product>,
    pub offset: u64,
    pub page_size: u64,
    pub total: u64,
}

impl Page {
    pub fn new(items: Vec<Product>, offset: u64, page_size: u64, total: u64) -> Self {
        Self {
            items,
            offset,
            page_size,
            total,
        }
    }

    /// Build a page from a listing response for the request that produced it.
    ///
    /// Offset and size come from the request, not the response.
    pub fn from_response(response: ProductsResponse, offset: u64, page_size: u64) -> Self {
        Self {
            items: response.products,
            offset,
            page_size,
            total: response.total,
        }
    }

    /// Offset of the following page. Saturates at `u64::MAX`.
    pub fn next_offset(&self) -> u64 {
        self.offset.saturating_add(self.page_size)
    }

    /// Whether no further page exists for this page's filter.
    pub fn is_last(&self) -> bool {
        self.next_offset() >= self.total
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parameters of a single listing request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub filter: FilterKey,
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(filter: FilterKey, offset: u64, limit: u64) -> Self {
        Self {
            filter,
            offset,
            limit,
        }
    }

    pub fn first(filter: FilterKey, limit: u64) -> Self {
        Self::new(filter, 0, limit)
    }
}
