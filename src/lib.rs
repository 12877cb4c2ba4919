//! solvefeed: on-demand RSS synthesis for LeetCode solution articles.
//!
//! The crate turns one or more users' published solution articles into a
//! single RSS 2.0 feed, fetched on demand from the LeetCode GraphQL API and
//! cached with stale-while-revalidate semantics.
//!
//! The modules map to the pipeline a request flows through:
//!
//! - [`upstream`] - one GraphQL round-trip per subject, plus subject/limit
//!   validation
//! - [`feed`] - bounded-concurrency fan-out, deterministic merge ordering,
//!   and XML rendering
//! - [`cache`] - the single-slot in-memory tier for the aggregate feed
//! - [`storage`] - SQLite-backed feed descriptors and the persisted cache
//!   tier
//! - [`serve`] - request coalescing, conditional responses, and the
//!   stale-fallback serving engine
//!
//! HTTP routing, authentication, and session handling are deliberately out
//! of scope: [`serve::FeedServer::serve`] and [`serve::AggregateFeed::serve`]
//! are the surface an HTTP layer calls into.

pub mod cache;
pub mod config;
pub mod feed;
pub mod serve;
pub mod storage;
pub mod upstream;
