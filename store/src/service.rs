//! Applies persisted overrides on top of the base configuration.
//!
//! Reads never fail because of a bad row: a row with an unknown key, a value
//! that does not decode, a value of the wrong kind, or a value the typed
//! [`SystemConfig`] cannot hold is logged and skipped, and the base value
//! stays in effect. Only storage errors propagate. Writes apply the same
//! checks, so `set` never stores a value that reads would ignore.

use serde_json::Value;
use sysconf_config::{
    decode_for, system_registry, CodecError, ConfigError, ConfigValue, KeyRegistry,
    RegistryError, SystemConfig, SystemConfigEntry, SystemConfigKey, SEPARATOR,
};

use crate::db::{ConfigStore, Result, SystemConfigRow};
use crate::error::StoreError;

/// Why a stored row was not applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowProblem {
    #[error("key is not registered")]
    UnknownKey,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("{0}")]
    Invalid(String),
}

/// A stored row that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub row: SystemConfigRow,
    pub problem: RowProblem,
}

/// Decoded overrides, split into usable entries and skipped rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub entries: Vec<SystemConfigEntry>,
    pub rejected: Vec<RejectedRow>,
}

pub struct SystemConfigService {
    store: ConfigStore,
    registry: &'static KeyRegistry,
    base: SystemConfig,
    base_json: Value,
}

impl SystemConfigService {
    /// Service over compiled-in defaults.
    pub fn new(store: ConfigStore) -> Result<Self> {
        Self::with_base(store, SystemConfig::default())
    }

    /// Service whose non-overridden values come from `base`, typically a
    /// file-loaded configuration.
    pub fn with_base(store: ConfigStore, base: SystemConfig) -> Result<Self> {
        let registry = system_registry()?;
        let base_json = base.to_json()?;
        Ok(Self {
            store,
            registry,
            base,
            base_json,
        })
    }

    pub const fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub const fn registry(&self) -> &'static KeyRegistry {
        self.registry
    }

    pub const fn base(&self) -> &SystemConfig {
        &self.base
    }

    /// All stored overrides, decoded against the registry.
    pub async fn overrides(&self) -> Result<Overrides> {
        let mut overrides = Overrides::default();
        for row in self.store.list().await? {
            match self.decode_row(&row) {
                Ok(entry) => overrides.entries.push(entry),
                Err(problem) => {
                    tracing::warn!(
                        key = %row.key,
                        value = ?row.value,
                        error = %problem,
                        "Ignoring stored config override"
                    );
                    overrides.rejected.push(RejectedRow { row, problem });
                }
            }
        }
        Ok(overrides)
    }

    /// Effective configuration: the base with every usable override applied.
    pub async fn load(&self) -> Result<SystemConfig> {
        let overrides = self.overrides().await?;
        let mut json = self.base_json.clone();
        for entry in &overrides.entries {
            apply(&mut json, entry);
        }
        Ok(SystemConfig::from_json(json)?)
    }

    /// Effective value of one key. `None` is an explicit null.
    pub async fn get(&self, key: SystemConfigKey) -> Result<Option<ConfigValue>> {
        if let Some(row) = self.store.get(key.path()).await? {
            match self.decode_row(&row) {
                Ok(entry) => return Ok(entry.value),
                Err(problem) => tracing::warn!(
                    key = %row.key,
                    value = ?row.value,
                    error = %problem,
                    "Ignoring stored config override"
                ),
            }
        }
        self.base_value(key)
    }

    /// Persists an override after checking its kind and that the typed
    /// config can hold it. A value equal to the base value removes the
    /// override instead.
    pub async fn set(&self, key: SystemConfigKey, value: Option<ConfigValue>) -> Result<()> {
        let leaf = self
            .registry
            .leaf_for_path(key.path())
            .ok_or_else(|| RegistryError::UnknownKey(key.name().to_string()))?;

        let problem = match &value {
            None if !leaf.nullable => Some(CodecError::NullNotAllowed {
                expected: leaf.kind,
            }),
            Some(v) if v.kind() != leaf.kind => Some(CodecError::KindMismatch {
                expected: leaf.kind,
                found: v.kind(),
            }),
            _ => None,
        };
        if let Some(source) = problem {
            return Err(StoreError::Codec {
                key: key.path().to_string(),
                source,
            });
        }

        let entry = SystemConfigEntry {
            key: key.path().to_string(),
            value,
        };
        self.check_fit(&entry)?;

        if entry.value == self.base_value(key)? {
            self.store.delete(key.path()).await?;
            tracing::debug!(key = %key, "Override matches base value, removed");
            return Ok(());
        }

        self.store.upsert(&SystemConfigRow::from(&entry)).await?;
        tracing::debug!(key = %key, "Override stored");
        Ok(())
    }

    /// Drops the override for `key`, reverting it to the base value.
    pub async fn reset(&self, key: SystemConfigKey) -> Result<bool> {
        self.store.delete(key.path()).await
    }

    /// Deletes rows whose key is no longer registered and returns their keys.
    pub async fn prune_stale(&self) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|row| !self.registry.contains_path(&row.key))
            .map(|row| row.key)
            .collect();

        if !stale.is_empty() {
            let deleted = self.store.delete_many(&stale).await?;
            tracing::info!(deleted, keys = ?stale, "Pruned stale config overrides");
        }
        Ok(stale)
    }

    fn decode_row(&self, row: &SystemConfigRow) -> std::result::Result<SystemConfigEntry, RowProblem> {
        let leaf = self
            .registry
            .leaf_for_path(&row.key)
            .ok_or(RowProblem::UnknownKey)?;
        let value = decode_for(leaf, row.value.as_deref())?;
        let entry = SystemConfigEntry {
            key: row.key.clone(),
            value,
        };
        self.check_fit(&entry)
            .map_err(|err| RowProblem::Invalid(err.to_string()))?;
        Ok(entry)
    }

    /// Fails when `entry` applied alone to the base no longer deserializes,
    /// e.g. a negative or fractional number for an unsigned field.
    fn check_fit(&self, entry: &SystemConfigEntry) -> std::result::Result<(), ConfigError> {
        let mut json = self.base_json.clone();
        apply(&mut json, entry);
        SystemConfig::from_json(json)
            .map(|_| ())
            .map_err(|err| ConfigError::InvalidValue(format!("{}: {err}", entry.key)))
    }

    fn base_value(&self, key: SystemConfigKey) -> Result<Option<ConfigValue>> {
        let json = self
            .base_json
            .pointer(&pointer(key.path()))
            .cloned()
            .unwrap_or(Value::Null);
        ConfigValue::from_json(json).map_err(|source| StoreError::Codec {
            key: key.path().to_string(),
            source,
        })
    }
}

fn pointer(path: &str) -> String {
    path.split(SEPARATOR)
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

fn apply(json: &mut Value, entry: &SystemConfigEntry) {
    if let Some(slot) = json.pointer_mut(&pointer(&entry.key)) {
        *slot = entry.value.as_ref().map_or(Value::Null, Value::from);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_escapes_segments() {
        assert_eq!(pointer("ffmpeg.crf"), "/ffmpeg/crf");
        assert_eq!(pointer("a/b.c~d"), "/a~1b/c~0d");
    }

    #[test]
    fn apply_replaces_leaf_and_writes_null() {
        let mut json = serde_json::json!({ "oauth": { "defaultStorageQuota": 5, "scope": "x" } });
        apply(
            &mut json,
            &SystemConfigEntry::null(SystemConfigKey::OauthDefaultStorageQuota),
        );
        apply(
            &mut json,
            &SystemConfigEntry::new(SystemConfigKey::OauthScope, "openid"),
        );
        assert_eq!(
            json,
            serde_json::json!({ "oauth": { "defaultStorageQuota": null, "scope": "openid" } })
        );
    }
}
