//! Request-driven serving: refresh coalescing, conditional responses, and
//! stale-while-revalidate fallback.
//!
//! [`FeedServer`] drives the persisted-feed path: fresh cache hits serve
//! directly; stale or absent entries trigger exactly one coalesced rebuild
//! per feed identity; a failed rebuild falls back to stale bytes when any
//! exist. [`AggregateFeed`] is the simpler no-persistence path backed by the
//! single-slot ephemeral cache.

mod aggregate;
mod conditional;
mod engine;
mod singleflight;

pub use aggregate::AggregateFeed;
pub use conditional::{
    fingerprint, not_modified, response_headers, ConditionalRequest, ResponseHeaders,
    STALE_WARNING,
};
pub use engine::{FeedServer, ServeOutcome};
pub use singleflight::{Abandoned, SingleFlight};
