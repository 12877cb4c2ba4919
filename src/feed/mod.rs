//! Feed synthesis: fetch fan-out, deterministic merge ordering, and RSS
//! rendering.
//!
//! [`FeedBuilder::build`] is the whole pipeline for one feed: validate
//! subjects, fetch each subject's articles concurrently (fail-fast), sort
//! the merged result into the feed's visible order, and render RSS 2.0
//! bytes. Rendering is deterministic (the same inputs always produce the
//! same bytes) because the conditional-response layer fingerprints the
//! output.

mod builder;
mod rss;

pub use builder::{BuildError, FeedBuilder};
pub use rss::{render, Feed, Item};
