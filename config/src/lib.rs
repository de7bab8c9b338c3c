//! sysconf configuration registry
//!
//! Describes the system configuration as a static schema tree, derives the
//! dot-notation path of every leaf, binds stable key names to those paths,
//! and encodes single leaf values for a generic key/value table so any leaf
//! can be overridden at runtime.
//!
//! # Layers
//!
//! 1. Compiled-in defaults ([`SystemConfig::default`])
//! 2. Config files, see [`ConfigLoader`]
//! 3. Persisted per-key overrides ([`SystemConfigEntry`]), applied by the
//!    consuming service
//!
//! # Example
//!
//! ```
//! use sysconf_config::{decode_for, encode, system_registry, ConfigValue, SystemConfigKey};
//!
//! let registry = system_registry().unwrap();
//! let path = registry.resolve("TRASH_DAYS").unwrap();
//! assert_eq!(path, SystemConfigKey::TrashDays.path());
//!
//! let stored = encode(&ConfigValue::from(3));
//! let leaf = registry.leaf_for_path(path).unwrap();
//! assert_eq!(decode_for(leaf, Some(stored.as_str())).unwrap(), Some(ConfigValue::from(3)));
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
pub mod registry;
pub mod schema;
mod types;
pub mod value;

pub use error::{CodecError, ConfigError, RegistryError, SchemaError};
pub use loader::{ConfigLoader, CONFIG_FILE_ENV};
pub use registry::{system_registry, KeyRegistry, RegistryEntry, SystemConfigKey};
pub use schema::{Leaf, LeafPath, Node, ValueKind, SEPARATOR};
pub use types::*;
pub use value::{decode, decode_for, encode, ConfigValue, SystemConfigEntry};

/// Load the base configuration from default locations.
pub fn load() -> Result<SystemConfig, ConfigError> {
    ConfigLoader::new().load()
}

/// Load the base configuration from a specific file.
pub fn load_from_file(path: &str) -> Result<SystemConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}
