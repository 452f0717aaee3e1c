//! SQLite quotation store
//!
//! One `quotations` table indexed by timestamp. Every operation runs under
//! the store deadline so the fast path never stalls the request behind a
//! slow disk or an exhausted pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::deadline::with_deadline;
use crate::core::error::QuoteError;
use crate::core::quotation::Quotation;
use crate::core::store::{QuotationStore, start_of_local_day};

pub struct SqliteQuotationStore {
    pool: SqlitePool,
    budget: Duration,
}

impl SqliteQuotationStore {
    /// Opens (creating if needed) the database at `db_path` and ensures the schema.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `pool_size` - Maximum number of connections in the pool
    /// * `budget` - Deadline applied to each store operation
    pub async fn open(db_path: &str, pool_size: u32, budget: Duration) -> Result<Self> {
        info!(
            "Opening quotation store at: {} with pool size: {}",
            db_path, pool_size
        );

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool, budget };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quotations (
                id TEXT PRIMARY KEY NOT NULL,
                value REAL NOT NULL,
                timestamp INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create quotations table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_quotations_timestamp ON quotations(timestamp);")
            .execute(&self.pool)
            .await
            .context("Failed to create timestamp index")?;

        debug!("Quotation store schema ready");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn row_count(&self, timestamp: i64) -> i64 {
        sqlx::query("SELECT COUNT(*) AS n FROM quotations WHERE timestamp = ?")
            .bind(timestamp)
            .fetch_one(&self.pool)
            .await
            .map(|row| row.get("n"))
            .unwrap_or(-1)
    }

    async fn select_by_timestamp(&self, timestamp: i64) -> Result<Option<Quotation>, QuoteError> {
        let row = sqlx::query("SELECT id, value, timestamp FROM quotations WHERE timestamp = ? LIMIT 1")
            .bind(timestamp)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_quotation).transpose()?)
    }
}

fn row_to_quotation(row: &SqliteRow) -> Result<Quotation, sqlx::Error> {
    Ok(Quotation {
        id: row.try_get("id")?,
        value: row.try_get("value")?,
        timestamp: row.try_get("timestamp")?,
    })
}

#[async_trait]
impl QuotationStore for SqliteQuotationStore {
    async fn find_today(&self, now: DateTime<Local>) -> Result<Option<Quotation>, QuoteError> {
        let start = start_of_local_day(&now);
        let end = now.timestamp();

        with_deadline("store.find_today", self.budget, async {
            let row = sqlx::query(
                "SELECT id, value, timestamp FROM quotations \
                 WHERE timestamp >= ? AND timestamp <= ? \
                 ORDER BY timestamp DESC LIMIT 1",
            )
            .bind(start)
            .bind(end)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, QuoteError>(row.as_ref().map(row_to_quotation).transpose()?)
        })
        .await
    }

    async fn find_by_timestamp(&self, timestamp: i64) -> Result<Option<Quotation>, QuoteError> {
        with_deadline(
            "store.find_by_timestamp",
            self.budget,
            self.select_by_timestamp(timestamp),
        )
        .await
    }

    async fn insert(&self, quotation: &Quotation) -> Result<Quotation, QuoteError> {
        with_deadline("store.insert", self.budget, async {
            // Existence check and write in one statement, so concurrent
            // writers cannot both insert the same timestamp.
            let result = sqlx::query(
                "INSERT INTO quotations (id, value, timestamp) \
                 SELECT ?, ?, ? \
                 WHERE NOT EXISTS (SELECT 1 FROM quotations WHERE timestamp = ?)",
            )
            .bind(&quotation.id)
            .bind(quotation.value)
            .bind(quotation.timestamp)
            .bind(quotation.timestamp)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 1 {
                debug!(id = %quotation.id, timestamp = quotation.timestamp, "Inserted quotation");
                return Ok(quotation.clone());
            }

            debug!(
                timestamp = quotation.timestamp,
                "Timestamp already stored, keeping the existing row"
            );
            self.select_by_timestamp(quotation.timestamp)
                .await?
                .ok_or_else(|| {
                    QuoteError::StoreUnavailable(format!(
                        "No row for timestamp {} after a rejected insert",
                        quotation.timestamp
                    ))
                })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::{TempDir, tempdir};

    async fn open_store(pool_size: u32, budget: Duration) -> (TempDir, SqliteQuotationStore) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quotations.db");
        let store = SqliteQuotationStore::open(path.to_str().unwrap(), pool_size, budget)
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_insert_and_find_by_timestamp() {
        let (_dir, store) = open_store(5, Duration::from_secs(1)).await;

        assert!(store.find_by_timestamp(1_700_000_000).await.unwrap().is_none());

        let quotation = Quotation::new(5.31, 1_700_000_000);
        let stored = store.insert(&quotation).await.unwrap();
        assert_eq!(stored, quotation);

        let found = store.find_by_timestamp(1_700_000_000).await.unwrap();
        assert_eq!(found, Some(quotation));
    }

    #[tokio::test]
    async fn test_insert_keeps_first_row_for_timestamp() {
        let (_dir, store) = open_store(5, Duration::from_secs(1)).await;

        let first = Quotation::new(5.31, 1_700_000_000);
        let second = Quotation::new(5.40, 1_700_000_000);
        store.insert(&first).await.unwrap();

        let stored = store.insert(&second).await.unwrap();
        assert_eq!(stored, first);
        assert_eq!(store.row_count(1_700_000_000).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_store_one_row() {
        let (_dir, store) = open_store(5, Duration::from_secs(5)).await;
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move {
                    let quotation = Quotation::new(5.0 + i as f64 / 100.0, 1_700_000_000);
                    store.insert(&quotation).await.unwrap()
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(store.row_count(1_700_000_000).await, 1);
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_find_today_window() {
        let (_dir, store) = open_store(5, Duration::from_secs(1)).await;
        let now = Local.timestamp_opt(1_700_000_000, 0).unwrap();
        let start = start_of_local_day(&now);

        assert!(store.find_today(now).await.unwrap().is_none());

        // Yesterday and the future are outside the window.
        store.insert(&Quotation::new(5.10, start - 1)).await.unwrap();
        store.insert(&Quotation::new(5.50, now.timestamp() + 1)).await.unwrap();
        assert!(store.find_today(now).await.unwrap().is_none());

        let today = Quotation::new(5.31, start);
        store.insert(&today).await.unwrap();
        assert_eq!(store.find_today(now).await.unwrap(), Some(today));

        let later = Quotation::new(5.33, now.timestamp());
        store.insert(&later).await.unwrap();
        assert_eq!(store.find_today(now).await.unwrap(), Some(later));
    }

    #[tokio::test]
    async fn test_schema_creation_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quotations.db");
        let path = path.to_str().unwrap();

        let store = SqliteQuotationStore::open(path, 1, Duration::from_secs(1))
            .await
            .unwrap();
        let quotation = Quotation::new(5.31, 1_700_000_000);
        store.insert(&quotation).await.unwrap();
        store.pool.close().await;

        let reopened = SqliteQuotationStore::open(path, 1, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(
            reopened.find_by_timestamp(1_700_000_000).await.unwrap(),
            Some(quotation)
        );
    }

    #[tokio::test]
    async fn test_operation_exceeding_budget_times_out() {
        let (_dir, store) = open_store(1, Duration::from_millis(10)).await;

        // Holding the only connection makes the next operation wait on the pool.
        let _conn = store.pool.acquire().await.unwrap();

        let err = store.find_by_timestamp(1_700_000_000).await.unwrap_err();
        match err {
            QuoteError::Timeout { operation, budget } => {
                assert_eq!(operation, "store.find_by_timestamp");
                assert_eq!(budget, Duration::from_millis(10));
            }
            other => panic!("Expected timeout, got {other:?}"),
        }

        let err = store
            .insert(&Quotation::new(5.31, 1_700_000_000))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "Timeout");
    }
}
