use anyhow::Result;
use chrono::Utc;

use super::db::Database;
use super::types::{from_unix, FeedRecord};

/// Row type for the full feeds projection.
type FeedRow = (String, String, String, String, i64, i64, i64, i64);

impl Database {
    // ========================================================================
    // Feed Descriptor Operations
    // ========================================================================

    /// Insert a new feed descriptor.
    pub async fn create_feed(&self, feed: &FeedRecord) -> Result<()> {
        let subjects = serde_json::to_string(&feed.subjects)?;
        sqlx::query(
            r#"
            INSERT INTO feeds
                (id, name, secret, subjects, limit_per_subject, enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(&feed.id)
        .bind(&feed.name)
        .bind(&feed.secret)
        .bind(&subjects)
        .bind(feed.limit_per_subject)
        .bind(feed.enabled)
        .bind(feed.created_at.timestamp())
        .bind(feed.updated_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a feed by identity alone.
    pub async fn get_feed(&self, id: &str) -> Result<Option<FeedRecord>> {
        let row: Option<FeedRow> = sqlx::query_as(
            r#"
            SELECT id, name, secret, subjects, limit_per_subject, enabled, created_at, updated_at
            FROM feeds WHERE id = ?
        "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(feed_from_row).transpose()
    }

    /// Look up a feed by identity and secret, as the public feed URL does.
    /// A wrong secret is indistinguishable from a missing feed.
    pub async fn get_feed_by_id_and_secret(
        &self,
        id: &str,
        secret: &str,
    ) -> Result<Option<FeedRecord>> {
        let row: Option<FeedRow> = sqlx::query_as(
            r#"
            SELECT id, name, secret, subjects, limit_per_subject, enabled, created_at, updated_at
            FROM feeds WHERE id = ? AND secret = ?
        "#,
        )
        .bind(id)
        .bind(secret)
        .fetch_optional(&self.pool)
        .await?;

        row.map(feed_from_row).transpose()
    }

    /// Flip a feed's enabled flag.
    pub async fn set_feed_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        sqlx::query("UPDATE feeds SET enabled = ?, updated_at = ? WHERE id = ?")
            .bind(enabled)
            .bind(Utc::now().timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace a feed's subject set and per-subject limit.
    ///
    /// Either change makes any persisted render stale by definition, so the
    /// cache entry is invalidated in the same transaction.
    pub async fn update_feed_subjects(
        &self,
        id: &str,
        subjects: &[String],
        limit_per_subject: i64,
    ) -> Result<()> {
        let subjects_json = serde_json::to_string(subjects)?;
        let now = Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE feeds SET subjects = ?, limit_per_subject = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&subjects_json)
        .bind(limit_per_subject)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM feed_cache WHERE feed_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

fn feed_from_row(row: FeedRow) -> Result<FeedRecord> {
    let (id, name, secret, subjects, limit_per_subject, enabled, created_at, updated_at) = row;
    Ok(FeedRecord {
        id,
        name,
        secret,
        subjects: serde_json::from_str(&subjects)?,
        limit_per_subject,
        enabled: enabled != 0,
        created_at: from_unix(created_at),
        updated_at: from_unix(updated_at),
    })
}
