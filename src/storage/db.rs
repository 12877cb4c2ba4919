use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Handle to the SQLite store backing feed descriptors and the persisted
/// cache tier.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a database connection and run migrations.
    pub async fn open(path: &str) -> Result<Self> {
        let url = format!("sqlite:{}?mode=rwc", path);
        // An in-memory database exists per connection; a single connection
        // keeps all readers and writers on the same data.
        let max_connections = if path == ":memory:" { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeds (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                secret TEXT NOT NULL,
                subjects TEXT NOT NULL,
                limit_per_subject INTEGER NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feed_cache (
                feed_id TEXT PRIMARY KEY REFERENCES feeds(id) ON DELETE CASCADE,
                xml BLOB NOT NULL,
                etag TEXT NOT NULL,
                built_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                last_error TEXT
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
