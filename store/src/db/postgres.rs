//! PostgreSQL database implementation for sysconf-store.

#![allow(clippy::missing_errors_doc)]

use sqlx::{postgres::PgPoolOptions, PgPool};

use super::models::SystemConfigRow;
use super::Result;
use crate::error::StoreError;

/// PostgreSQL-backed override store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to PostgreSQL database.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(dsn)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect to PostgreSQL: {e}")))?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS system_config (
                key VARCHAR PRIMARY KEY,
                value VARCHAR
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
            WHERE key = $1
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
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            ",
        )
        .bind(&row.key)
        .bind(&row.value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM system_config WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM system_config WHERE key = ANY($1)")
            .bind(keys)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
