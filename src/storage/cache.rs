use anyhow::Result;

use super::db::Database;
use super::types::{from_unix, FeedCacheEntry};

/// Row type for the feed_cache projection.
type CacheRow = (String, Vec<u8>, String, i64, i64, Option<String>);

impl Database {
    // ========================================================================
    // Persisted Cache Operations
    // ========================================================================

    /// Read the persisted cache entry for a feed, fresh or not.
    /// Freshness is the caller's call; this tier only stores.
    pub async fn get_feed_cache(&self, feed_id: &str) -> Result<Option<FeedCacheEntry>> {
        let row: Option<CacheRow> = sqlx::query_as(
            r#"
            SELECT feed_id, xml, etag, built_at, expires_at, last_error
            FROM feed_cache WHERE feed_id = ?
        "#,
        )
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(feed_id, xml, etag, built_at, expires_at, last_error)| FeedCacheEntry {
                feed_id,
                xml,
                etag,
                built_at: from_unix(built_at),
                expires_at: from_unix(expires_at),
                last_error,
            },
        ))
    }

    /// Whole-entry replace of a feed's cache row.
    pub async fn set_feed_cache(&self, entry: &FeedCacheEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO feed_cache
                (feed_id, xml, etag, built_at, expires_at, last_error)
            VALUES (?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(&entry.feed_id)
        .bind(&entry.xml)
        .bind(&entry.etag)
        .bind(entry.built_at.timestamp())
        .bind(entry.expires_at.timestamp())
        .bind(&entry.last_error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a refresh failure against a feed's existing cache row.
    ///
    /// Previously cached bytes stay servable as stale; only the error
    /// column changes. A feed that has never rendered successfully keeps no
    /// row at all, so a failed first build leaves the store untouched.
    pub async fn record_feed_error(&self, feed_id: &str, error: &str) -> Result<()> {
        sqlx::query("UPDATE feed_cache SET last_error = ? WHERE feed_id = ?")
            .bind(error)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Drop the persisted entry for a feed.
    pub async fn invalidate_feed_cache(&self, feed_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM feed_cache WHERE feed_id = ?")
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
