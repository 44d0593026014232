//! SQLite storage implementation.
//!
//! A file-based storage backend using SQLite. Good for:
//! - Keeping collected artifacts across scanner sessions
//! - Browsing the data board from a separate process

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::{CollectorError, Result};
use crate::traits::store::{sort_rows, DataStore, HostQuery, Row};
use crate::types::buckets::{Category, ExtractionResult};

/// SQLite-based artifact store.
///
/// One table holds every category; name-only rows store an empty value.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://collector.db?mode=rwc` - Create if not exists
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::connect(database_url, 5).await
    }

    /// Create an in-memory SQLite store (for testing).
    ///
    /// Every pooled connection to `:memory:` is its own database, so the
    /// pool is held to a single connection.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await
            .map_err(CollectorError::storage)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collected (
                host TEXT NOT NULL,
                category TEXT NOT NULL,
                name TEXT NOT NULL,
                value TEXT NOT NULL DEFAULT '',
                count INTEGER NOT NULL DEFAULT 1,
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                PRIMARY KEY (host, category, name, value)
            );

            CREATE INDEX IF NOT EXISTS idx_collected_category ON collected(category, host);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(CollectorError::storage)?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_value(category: Category, value: String) -> Option<String> {
    category.has_values().then_some(value)
}

#[async_trait]
impl DataStore for SqliteStore {
    async fn insert(&self, host: &str, buckets: &ExtractionResult) -> Result<()> {
        let host = host.to_lowercase();
        let now = chrono::Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await.map_err(CollectorError::storage)?;
        for (category, bucket) in buckets {
            for (name, value) in bucket.rows() {
                sqlx::query(
                    r#"
                    INSERT INTO collected (host, category, name, value, count, first_seen, last_seen)
                    VALUES (?, ?, ?, ?, 1, ?, ?)
                    ON CONFLICT(host, category, name, value) DO UPDATE SET
                        count = count + 1,
                        last_seen = excluded.last_seen
                    "#,
                )
                .bind(&host)
                .bind(category.label())
                .bind(name)
                .bind(value.unwrap_or_default())
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(CollectorError::storage)?;
            }
        }
        tx.commit().await.map_err(CollectorError::storage)?;

        Ok(())
    }

    async fn query(&self, host: &HostQuery, category: Category, limit: usize) -> Result<Vec<Row>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut rows: Vec<Row> = match host {
            HostQuery::Exact(host) => {
                let found: Vec<(String, String, String, i64)> = sqlx::query_as(
                    r#"
                    SELECT host, name, value, count FROM collected
                    WHERE category = ? AND host = ?
                    ORDER BY count DESC, name, value
                    LIMIT ?
                    "#,
                )
                .bind(category.label())
                .bind(host)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(CollectorError::storage)?;

                found
                    .into_iter()
                    .map(|(host, name, value, count)| Row {
                        host: Some(host),
                        name,
                        value: row_value(category, value),
                        count: count.max(0) as u64,
                    })
                    .collect()
            }
            HostQuery::Any => {
                let found: Vec<(String, String, i64)> = sqlx::query_as(
                    r#"
                    SELECT name, value, SUM(count) AS total FROM collected
                    WHERE category = ?
                    GROUP BY name, value
                    ORDER BY total DESC, name, value
                    LIMIT ?
                    "#,
                )
                .bind(category.label())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(CollectorError::storage)?;

                found
                    .into_iter()
                    .map(|(name, value, count)| Row {
                        host: None,
                        name,
                        value: row_value(category, value),
                        count: count.max(0) as u64,
                    })
                    .collect()
            }
        };

        sort_rows(&mut rows);
        Ok(rows)
    }

    async fn list_hosts(&self, category: Category) -> Result<Vec<String>> {
        sqlx::query_scalar("SELECT DISTINCT host FROM collected WHERE category = ? ORDER BY host")
            .bind(category.label())
            .fetch_all(&self.pool)
            .await
            .map_err(CollectorError::storage)
    }
}
