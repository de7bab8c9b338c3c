//! Database layer for sysconf-store.

#![allow(clippy::missing_errors_doc)]

pub mod models;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use crate::error::StoreError;
pub use models::*;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Override table abstraction.
///
/// The store knows nothing about the registry: any key may be written. Key
/// and kind checks belong to [`crate::SystemConfigService`].
#[derive(Clone)]
pub enum ConfigStore {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteStore),
    #[cfg(feature = "postgres")]
    Postgres(PostgresStore),
}

impl ConfigStore {
    /// Connect to database using DSN.
    pub async fn connect(dsn: &str) -> Result<Self> {
        if dsn.starts_with("sqlite:") {
            #[cfg(feature = "sqlite")]
            {
                let store = SqliteStore::connect(dsn).await?;
                return Ok(Self::Sqlite(store));
            }
            #[cfg(not(feature = "sqlite"))]
            {
                return Err(StoreError::Config("SQLite support not enabled".into()));
            }
        }

        if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") {
            #[cfg(feature = "postgres")]
            {
                let store = PostgresStore::connect(dsn).await?;
                return Ok(Self::Postgres(store));
            }
            #[cfg(not(feature = "postgres"))]
            {
                return Err(StoreError::Config("PostgreSQL support not enabled".into()));
            }
        }

        Err(StoreError::Config(format!("Unsupported DSN: {dsn}")))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::debug!("Ensuring system_config table");
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.migrate().await,
            #[cfg(feature = "postgres")]
            Self::Postgres(store) => store.migrate().await,
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<SystemConfigRow>> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.get(key).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(store) => store.get(key).await,
        }
    }

    /// Every row, ordered by key.
    pub async fn list(&self) -> Result<Vec<SystemConfigRow>> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.list().await,
            #[cfg(feature = "postgres")]
            Self::Postgres(store) => store.list().await,
        }
    }

    /// Insert or replace the row for `row.key` in one statement.
    pub async fn upsert(&self, row: &SystemConfigRow) -> Result<()> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.upsert(row).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(store) => store.upsert(row).await,
        }
    }

    /// Returns whether a row was removed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.delete(key).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(store) => store.delete(key).await,
        }
    }

    /// Returns the number of rows removed.
    pub async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(store) => store.delete_many(keys).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(store) => store.delete_many(keys).await,
        }
    }
}
