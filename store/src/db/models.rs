//! Database models for sysconf-store.

use sysconf_config::SystemConfigEntry;

/// One `system_config` row: a joined path and its JSON-encoded value.
///
/// A `NULL` value is an explicit null override; the absence of a row means
/// the key is not overridden.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SystemConfigRow {
    pub key: String,
    pub value: Option<String>, // JSON text
}

impl From<&SystemConfigEntry> for SystemConfigRow {
    fn from(entry: &SystemConfigEntry) -> Self {
        Self {
            key: entry.key.clone(),
            value: entry.encoded_value(),
        }
    }
}
