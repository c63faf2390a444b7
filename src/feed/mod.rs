//! Infinite-scroll feed: one session per filter key, pages appended in
//! offset order, state changes published as [`FeedEvent`]s.

mod controller;
mod events;
mod state;

pub use controller::FeedController;
pub use events::{FeedEvent, SubscriptionId, FEED_CHANGED};
pub use state::{FeedError, FeedErrorKind, FeedSession, FeedStatus, FeedView, LoadOutcome};
