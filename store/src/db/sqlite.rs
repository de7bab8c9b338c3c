//! `SQLite` database implementation for sysconf-store.

#![allow(clippy::missing_errors_doc)]

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use super::models::SystemConfigRow;
use super::Result;
use crate::error::StoreError;

/// SQLite-backed override store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `SQLite` database.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let url = if dsn.starts_with("sqlite:") {
            dsn.to_string()
        } else {
            format!("sqlite:{dsn}")
        };

        // An in-memory database lives only as long as its connections, so keep
        // exactly one open for the lifetime of the pool.
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        // Ensure create-if-not-exists mode for file databases
        let url = if in_memory || url.contains("mode=") {
            url
        } else if url.contains('?') {
            format!("{url}&mode=rwc")
        } else {
            format!("{url}?mode=rwc")
        };

        let pool = options
            .connect(&url)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS system_config (
                key TEXT PRIMARY KEY,
                value TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<SystemConfigRow>> {
        let row = sqlx::query_as(
            r"
            SELECT key, value
            FROM system_config
            WHERE key = ?
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list(&self) -> Result<Vec<SystemConfigRow>> {
        let rows = sqlx::query_as(
            r"
            SELECT key, value
            FROM system_config
            ORDER BY key
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn upsert(&self, row: &SystemConfigRow) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO system_config (key, value)
            VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(&row.key)
        .bind(&row.value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM system_config WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;
        for key in keys {
            let result = sqlx::query("DELETE FROM system_config WHERE key = ?")
                .bind(key)
                .execute(&mut *tx)
                .await?;
            deleted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(deleted)
    }
}
