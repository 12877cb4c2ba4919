use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use super::conditional::{self, ConditionalRequest, ResponseHeaders};
use super::singleflight::SingleFlight;
use crate::feed::{BuildError, FeedBuilder};
use crate::storage::{from_unix, Database, FeedCacheEntry, FeedRecord};

/// Default lifetime of a persisted render.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
/// Default upper bound on a whole rebuild, all fetches included.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(30);

/// What a serve request resolved to. The embedding layer maps these onto
/// transport responses; `stale: true` asks it to attach
/// [`STALE_WARNING`](super::STALE_WARNING).
#[derive(Debug)]
pub enum ServeOutcome {
    Ok {
        body: Vec<u8>,
        headers: ResponseHeaders,
        stale: bool,
    },
    NotModified {
        headers: ResponseHeaders,
        stale: bool,
    },
    /// Unknown id, wrong secret, or disabled feed. All three look the same
    /// from outside.
    NotFound,
    /// No fresh render, no stale bytes to fall back on.
    BadGateway {
        message: String,
    },
}

/// Serves persisted feeds: fresh hits straight from the store, expired or
/// missing entries through a coalesced rebuild, failed rebuilds from stale
/// bytes when any exist.
pub struct FeedServer {
    store: Database,
    builder: Arc<FeedBuilder>,
    flight: SingleFlight<Result<FeedCacheEntry, Arc<BuildError>>>,
    ttl: Duration,
    build_timeout: Duration,
}

impl FeedServer {
    pub fn new(store: Database, builder: Arc<FeedBuilder>) -> Self {
        Self {
            store,
            builder,
            flight: SingleFlight::new(),
            ttl: DEFAULT_TTL,
            build_timeout: DEFAULT_BUILD_TIMEOUT,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_build_timeout(mut self, build_timeout: Duration) -> Self {
        self.build_timeout = build_timeout;
        self
    }

    /// Resolve one feed request end to end.
    ///
    /// `Err` is reserved for storage faults; everything the client caused
    /// (bad credentials, upstream trouble) comes back as a [`ServeOutcome`].
    pub async fn serve(
        &self,
        id: &str,
        secret: &str,
        conditional: &ConditionalRequest,
        self_url: Option<&str>,
    ) -> Result<ServeOutcome> {
        let Some(feed) = self.store.get_feed_by_id_and_secret(id, secret).await? else {
            return Ok(ServeOutcome::NotFound);
        };
        if !feed.enabled {
            return Ok(ServeOutcome::NotFound);
        }

        let cached = self.store.get_feed_cache(&feed.id).await?;
        if let Some(entry) = &cached {
            if entry.is_fresh(Utc::now()) {
                tracing::debug!(feed = %feed.id, "Serving fresh cache entry");
                return Ok(self.respond(entry, conditional, false));
            }
        }

        match self.refresh(&feed, self_url).await {
            Ok(entry) => Ok(self.respond(&entry, conditional, false)),
            Err(message) => match cached.filter(FeedCacheEntry::has_body) {
                Some(stale) => {
                    tracing::warn!(feed = %feed.id, error = %message, "Refresh failed, serving stale");
                    Ok(self.respond(&stale, conditional, true))
                }
                None => {
                    tracing::warn!(feed = %feed.id, error = %message, "Refresh failed, nothing to serve");
                    Ok(ServeOutcome::BadGateway { message })
                }
            },
        }
    }

    /// Rebuild a feed's cache entry, coalescing concurrent requests for the
    /// same feed into one build.
    ///
    /// The build runs on a detached task under the whole-build deadline;
    /// success persists the entry before any waiter sees it, failure records
    /// the error without touching previously cached bytes.
    async fn refresh(&self, feed: &FeedRecord, self_url: Option<&str>) -> Result<FeedCacheEntry, String> {
        let key = feed.id.clone();
        let store = self.store.clone();
        let builder = Arc::clone(&self.builder);
        let feed = feed.clone();
        let ttl = chrono::Duration::seconds(self.ttl.as_secs() as i64);
        let build_timeout = self.build_timeout;
        let self_url = self_url.map(str::to_string);

        let result = self
            .flight
            .run(&key, async move {
                let built = tokio::time::timeout(
                    build_timeout,
                    builder.build(&feed.subjects, feed.limit_per_subject, self_url.as_deref()),
                )
                .await
                .map_err(|_| BuildError::Deadline)
                .and_then(|inner| inner);

                let xml = match built {
                    Ok(xml) => xml,
                    Err(err) => {
                        if let Err(error) = store.record_feed_error(&feed.id, &err.to_string()).await
                        {
                            tracing::warn!(feed = %feed.id, %error, "Recording feed error failed");
                        }
                        return Err(Arc::new(err));
                    }
                };

                let built_at = from_unix(Utc::now().timestamp());
                let entry = FeedCacheEntry {
                    feed_id: feed.id.clone(),
                    etag: conditional::fingerprint(&xml),
                    xml,
                    built_at,
                    expires_at: built_at + ttl,
                    last_error: None,
                };
                // A persistence fault degrades to per-request rebuilds; the
                // bytes in hand still serve this round of waiters.
                if let Err(error) = store.set_feed_cache(&entry).await {
                    tracing::warn!(feed = %feed.id, %error, "Persisting feed cache entry failed");
                }
                Ok(entry)
            })
            .await;

        match result {
            Ok(Ok(entry)) => Ok(entry),
            Ok(Err(err)) => Err(err.to_string()),
            Err(abandoned) => Err(abandoned.to_string()),
        }
    }

    /// Conditional evaluation applies to stale serves too: a client already
    /// holding the stale bytes revalidates instead of downloading them again.
    fn respond(
        &self,
        entry: &FeedCacheEntry,
        conditional_request: &ConditionalRequest,
        stale: bool,
    ) -> ServeOutcome {
        let headers =
            conditional::response_headers(&entry.etag, entry.built_at, self.ttl.as_secs() as i64);
        if conditional::not_modified(conditional_request, &entry.etag, entry.built_at) {
            return ServeOutcome::NotModified { headers, stale };
        }
        ServeOutcome::Ok {
            body: entry.xml.clone(),
            headers,
            stale,
        }
    }
}
