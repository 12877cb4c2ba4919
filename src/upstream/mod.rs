//! Upstream access to the LeetCode GraphQL API.
//!
//! [`UpstreamClient`] issues exactly one round-trip per
//! [`UpstreamClient::fetch_solution_articles`] call and treats any
//! transport failure or upstream-reported error as a hard failure for that
//! subject. The client is stateless and safe to call concurrently.

mod client;
mod models;
mod subject;

pub use client::{UpstreamClient, UpstreamError};
pub use models::RawArticle;
pub use subject::{
    clamp_limit, parse_subject_list, validate_subject, SubjectError, DEFAULT_LIMIT, MAX_LIMIT,
    MIN_LIMIT,
};
