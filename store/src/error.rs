//! Error types for sysconf-store.

use sysconf_config::{CodecError, ConfigError, RegistryError};

/// Store and service error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid value for {key}: {source}")]
    Codec { key: String, source: CodecError },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) => Self::Database(db_err.message().to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<ConfigError> for StoreError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
