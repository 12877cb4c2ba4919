use std::sync::Arc;
use std::time::Duration;

use crate::cache::EphemeralCache;
use crate::feed::{BuildError, FeedBuilder};

/// The fixed aggregate feed: one configured subject list, one in-process
/// cache slot, no persisted identity.
///
/// Misses rebuild inline without coalescing; the aggregate has exactly one
/// cache slot, and a duplicate build during a thundering herd costs one
/// redundant fetch round rather than correctness.
pub struct AggregateFeed {
    builder: Arc<FeedBuilder>,
    cache: EphemeralCache,
    subjects: Vec<String>,
    limit: i64,
    self_url: Option<String>,
}

impl AggregateFeed {
    pub fn new(builder: Arc<FeedBuilder>, subjects: Vec<String>, limit: i64, ttl: Duration) -> Self {
        Self {
            builder,
            cache: EphemeralCache::new(ttl),
            subjects,
            limit,
            self_url: None,
        }
    }

    /// Absolute URL the rendered feed advertises as its own address.
    pub fn with_self_url(mut self, self_url: impl Into<String>) -> Self {
        self.self_url = Some(self_url.into());
        self
    }

    /// Rendered bytes for the aggregate feed, cached for the slot TTL.
    pub async fn serve(&self) -> Result<Vec<u8>, BuildError> {
        if let Some(bytes) = self.cache.get() {
            tracing::debug!("Serving aggregate feed from cache");
            return Ok(bytes);
        }

        let xml = self
            .builder
            .build(&self.subjects, self.limit, self.self_url.as_deref())
            .await?;
        self.cache.set(xml.clone());
        Ok(xml)
    }
}
