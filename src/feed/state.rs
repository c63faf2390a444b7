use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::model::{FilterKey, Page, Product};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedStatus {
    /// No session yet, or the session was closed.
    Idle,
    /// Fetching the first page.
    Loading,
    /// At least one page held and more remain.
    Ready,
    /// Fetching the page after the last one held.
    LoadingMore,
    /// The last fetch failed; held pages are kept.
    Error,
    /// The last page held is the final page.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedErrorKind {
    Network,
    Remote,
    NotFound,
    Decode,
}

/// Failure surfaced to feed consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedError {
    pub kind: FeedErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FeedError {}

impl From<&CatalogError> for FeedError {
    fn from(err: &CatalogError) -> Self {
        let (kind, status) = match err {
            CatalogError::Network(_) => (FeedErrorKind::Network, None),
            CatalogError::Remote { status, .. } => (FeedErrorKind::Remote, Some(*status)),
            CatalogError::NotFound(_) => (FeedErrorKind::NotFound, Some(404)),
            CatalogError::Decode(_) => (FeedErrorKind::Decode, None),
        };
        Self {
            kind,
            message: err.to_string(),
            status,
        }
    }
}

impl From<CatalogError> for FeedError {
    fn from(err: CatalogError) -> Self {
        FeedError::from(&err)
    }
}

/// What a feed action ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Guard refused the action; nothing was fetched.
    Skipped,
    /// A page was fetched (or seeded) and applied.
    Loaded,
    /// The fetch resolved after its session was replaced and was dropped.
    Discarded,
}

/// Accumulated pagination state for one filter key.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSession {
    key: FilterKey,
    pages: Vec<Page>,
    status: FeedStatus,
    error: Option<FeedError>,
}

impl FeedSession {
    pub(crate) fn new(key: FilterKey) -> Self {
        Self {
            key,
            pages: Vec::new(),
            status: FeedStatus::Idle,
            error: None,
        }
    }

    pub(crate) fn loading(key: FilterKey) -> Self {
        Self {
            status: FeedStatus::Loading,
            ..Self::new(key)
        }
    }

    pub(crate) fn seeded(key: FilterKey, seed: Page) -> Self {
        let mut session = Self::new(key);
        session.apply_page(seed);
        session
    }

    pub fn key(&self) -> &FilterKey {
        &self.key
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn error(&self) -> Option<&FeedError> {
        self.error.as_ref()
    }

    /// All held items in offset order.
    pub fn items(&self) -> impl Iterator<Item = &Product> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    pub fn merged_items(&self) -> Vec<Product> {
        self.items().cloned().collect()
    }

    pub fn item_count(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }

    /// Total reported by the most recently fetched page.
    pub fn total(&self) -> Option<u64> {
        self.pages.last().map(|page| page.total)
    }

    pub fn next_offset(&self) -> u64 {
        self.pages.last().map_or(0, Page::next_offset)
    }

    pub fn has_more(&self) -> bool {
        self.pages.last().map_or(false, |page| !page.is_last())
    }

    pub(crate) fn set_status(&mut self, status: FeedStatus) {
        self.status = status;
        if status != FeedStatus::Error {
            self.error = None;
        }
    }

    pub(crate) fn fail(&mut self, error: FeedError) {
        self.status = FeedStatus::Error;
        self.error = Some(error);
    }

    pub(crate) fn apply_page(&mut self, page: Page) {
        let status = if page.is_last() {
            FeedStatus::Exhausted
        } else {
            FeedStatus::Ready
        };
        self.pages.push(page);
        self.set_status(status);
    }
}

/// Read model handed to renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedView {
    pub filter: FilterKey,
    pub status: FeedStatus,
    pub items: Vec<Product>,
    pub total: u64,
    pub is_loading: bool,
    pub is_fetching_more: bool,
    pub has_more: bool,
    pub error: Option<FeedError>,
}

impl FeedView {
    pub(crate) fn from_session(session: &FeedSession) -> Self {
        Self {
            filter: session.key.clone(),
            status: session.status,
            items: session.merged_items(),
            total: session.total().unwrap_or(0),
            is_loading: session.status == FeedStatus::Loading,
            is_fetching_more: session.status == FeedStatus::LoadingMore,
            has_more: session.has_more(),
            error: session.error.clone(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.status == FeedStatus::Exhausted
    }

    /// A failed first load: nothing to show but the error.
    pub fn is_empty_with_error(&self) -> bool {
        self.items.is_empty() && self.error.is_some()
    }

    pub fn progress_label(&self) -> String {
        format!("Showing {} of {} products", self.items.len(), self.total)
    }
}
