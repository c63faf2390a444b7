//! Sentinel visibility signal for infinite scroll.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::catalog::ProductCatalog;
use crate::feed::FeedController;

/// Margin added around the viewport when testing the sentinel, in pixels.
pub const DEFAULT_ROOT_MARGIN: f64 = 100.0;

/// Vertical extent of the sentinel and the viewport, in the same
/// coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentinelGeometry {
    pub sentinel_top: f64,
    pub sentinel_bottom: f64,
    pub viewport_top: f64,
    pub viewport_bottom: f64,
}

impl SentinelGeometry {
    /// Zero threshold: touching the expanded viewport counts.
    pub fn intersects(&self, root_margin: f64) -> bool {
        self.sentinel_top <= self.viewport_bottom + root_margin
            && self.sentinel_bottom >= self.viewport_top - root_margin
    }
}

type Callback = Box<dyn Fn() + Send + Sync>;

/// Edge-triggered "sentinel became visible" signal.
///
/// Fires on the not-visible to visible transition only; staying visible does
/// not fire again. Once detached it never fires.
pub struct ViewportTrigger {
    on_intersect: Option<Callback>,
    visible: bool,
    root_margin: f64,
    fired: u64,
}

impl ViewportTrigger {
    pub fn new<F>(on_intersect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            on_intersect: Some(Box::new(on_intersect)),
            visible: false,
            root_margin: DEFAULT_ROOT_MARGIN,
            fired: 0,
        }
    }

    /// Trigger that asks `feed` for its next page on `runtime`.
    pub fn for_feed<C: ProductCatalog>(feed: Arc<FeedController<C>>, runtime: Handle) -> Self {
        Self::new(move || {
            let feed = Arc::clone(&feed);
            runtime.spawn(async move {
                if let Err(err) = feed.request_next_page().await {
                    warn!(error = %err, "next page from viewport trigger failed");
                }
            });
        })
    }

    pub fn with_root_margin(mut self, margin: f64) -> Self {
        self.root_margin = margin;
        self
    }

    /// Report sentinel visibility. Returns whether the callback fired.
    pub fn observe(&mut self, visible: bool) -> bool {
        let was_visible = std::mem::replace(&mut self.visible, visible);
        if was_visible || !visible {
            return false;
        }
        match &self.on_intersect {
            Some(callback) => {
                self.fired += 1;
                debug!(fired = self.fired, "sentinel intersected");
                callback();
                true
            }
            None => false,
        }
    }

    pub fn observe_geometry(&mut self, geometry: &SentinelGeometry) -> bool {
        self.observe(geometry.intersects(self.root_margin))
    }

    pub fn detach(&mut self) {
        self.on_intersect = None;
    }

    pub fn is_attached(&self) -> bool {
        self.on_intersect.is_some()
    }

    pub fn fire_count(&self) -> u64 {
        self.fired
    }
}

impl fmt::Debug for ViewportTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportTrigger")
            .field("attached", &self.is_attached())
            .field("visible", &self.visible)
            .field("root_margin", &self.root_margin)
            .field("fired", &self.fired)
            .finish()
    }
}
