//! SQLite-backed persistence: feed descriptors and the persisted cache tier.

mod cache;
mod db;
mod feeds;
mod types;

pub use db::Database;
pub use types::{FeedCacheEntry, FeedRecord};

pub(crate) use types::from_unix;
