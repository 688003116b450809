//! SQLite storage layer for Binsight.
//!
//! Holds the two record sets the reporting core consumes: bin snapshots and
//! recycling transactions. All timestamps are stored as unix seconds; bin
//! status is stored as its lowercase wire string.
//!
//! The forecasting and aggregation modules never see this type — they take
//! materialized collections. Storage is only touched at the handler boundary.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::model::{BinSnapshot, BinStatus, TransactionEvent};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:binsight.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    /// Create the database schema if it doesn't exist.
    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bins (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                status TEXT NOT NULL,
                fill_level INTEGER NOT NULL,
                last_emptied_at INTEGER,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bin_id TEXT NOT NULL,
                user_id TEXT,
                points_earned INTEGER NOT NULL,
                co2_saved REAL NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Indexes for the status filter and trailing-window queries
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_bins_status ON bins(status)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transactions_created_at
            ON transactions(created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Register a new bin.
    ///
    /// Returns `false` (without modifying anything) when a bin with the same
    /// id already exists.
    pub async fn insert_bin(&self, bin: &BinSnapshot) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO bins (id, name, status, fill_level, last_emptied_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&bin.id)
        .bind(&bin.name)
        .bind(status_str(bin.status))
        .bind(bin.fill_level)
        .bind(bin.last_emptied_at.map(|ts| ts.timestamp()))
        .bind(bin.created_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a single bin by id.
    pub async fn get_bin(&self, id: &str) -> anyhow::Result<Option<BinSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, status, fill_level, last_emptied_at, created_at
            FROM bins
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| bin_from_row(&r)).transpose()
    }

    /// List bins ordered by id, optionally filtered by status.
    pub async fn list_bins(&self, status: Option<BinStatus>) -> anyhow::Result<Vec<BinSnapshot>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT id, name, status, fill_level, last_emptied_at, created_at
                    FROM bins
                    WHERE status = ?
                    ORDER BY id
                    "#,
                )
                .bind(status_str(status))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, name, status, fill_level, last_emptied_at, created_at
                    FROM bins
                    ORDER BY id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(bin_from_row).collect()
    }

    /// List only bins eligible for forecasting.
    pub async fn list_active_bins(&self) -> anyhow::Result<Vec<BinSnapshot>> {
        self.list_bins(Some(BinStatus::Active)).await
    }

    /// Apply a partial update to a bin. Fill levels are clamped into
    /// `[0, 100]` before storing.
    ///
    /// Returns the updated snapshot, or `None` when no such bin exists.
    pub async fn update_bin(
        &self,
        id: &str,
        fill_level: Option<i32>,
        status: Option<BinStatus>,
    ) -> anyhow::Result<Option<BinSnapshot>> {
        let Some(mut bin) = self.get_bin(id).await? else {
            return Ok(None);
        };

        if let Some(fill_level) = fill_level {
            bin.fill_level = fill_level.clamp(0, 100);
        }
        if let Some(status) = status {
            bin.status = status;
        }

        sqlx::query(
            r#"
            UPDATE bins SET fill_level = ?, status = ? WHERE id = ?
            "#,
        )
        .bind(bin.fill_level)
        .bind(status_str(bin.status))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(bin))
    }

    /// Mark a bin as emptied: fill level drops to zero, `last_emptied_at`
    /// moves to `now`, and the bin returns to active service.
    ///
    /// Returns the updated snapshot, or `None` when no such bin exists.
    pub async fn mark_emptied(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<BinSnapshot>> {
        let Some(mut bin) = self.get_bin(id).await? else {
            return Ok(None);
        };

        bin.fill_level = 0;
        bin.last_emptied_at = Some(now);
        bin.status = BinStatus::Active;

        sqlx::query(
            r#"
            UPDATE bins SET fill_level = 0, last_emptied_at = ?, status = ? WHERE id = ?
            "#,
        )
        .bind(now.timestamp())
        .bind(status_str(bin.status))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(bin))
    }

    /// Record a recycling transaction.
    pub async fn insert_transaction(
        &self,
        bin_id: &str,
        user_id: Option<&str>,
        points_earned: i64,
        co2_saved: f64,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (bin_id, user_id, points_earned, co2_saved, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(bin_id)
        .bind(user_id)
        .bind(points_earned)
        .bind(co2_saved)
        .bind(created_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List every recorded transaction, oldest first.
    pub async fn list_transactions(&self) -> anyhow::Result<Vec<TransactionEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT points_earned, co2_saved, created_at
            FROM transactions
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(transaction_from_row).collect())
    }

    /// List transactions recorded at or after `since`, oldest first.
    pub async fn list_transactions_since(
        &self,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<TransactionEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT points_earned, co2_saved, created_at
            FROM transactions
            WHERE created_at >= ?
            ORDER BY created_at
            "#,
        )
        .bind(since.timestamp())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(transaction_from_row).collect())
    }

    /// Count distinct depositors seen across all transactions.
    pub async fn count_distinct_users(&self) -> anyhow::Result<u64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(DISTINCT user_id) as total
            FROM transactions
            WHERE user_id IS NOT NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.get("total");
        Ok(total as u64)
    }
}

fn status_str(status: BinStatus) -> &'static str {
    match status {
        BinStatus::Active => "active",
        BinStatus::Maintenance => "maintenance",
        BinStatus::Full => "full",
    }
}

fn bin_from_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<BinSnapshot> {
    let status: String = row.get("status");
    let last_emptied_at: Option<i64> = row.get("last_emptied_at");
    let created_at: i64 = row.get("created_at");

    Ok(BinSnapshot {
        id: row.get("id"),
        name: row.get("name"),
        status: BinStatus::from_str(&status)?,
        fill_level: row.get("fill_level"),
        last_emptied_at: last_emptied_at.map(|ts| Utc.timestamp_opt(ts, 0).unwrap()),
        created_at: Utc.timestamp_opt(created_at, 0).unwrap(),
    })
}

fn transaction_from_row(row: &sqlx::sqlite::SqliteRow) -> TransactionEvent {
    let created_at: i64 = row.get("created_at");

    TransactionEvent {
        created_at: Utc.timestamp_opt(created_at, 0).unwrap(),
        points_earned: row.get("points_earned"),
        co2_saved: row.get("co2_saved"),
    }
}
