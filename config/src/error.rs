use std::path::PathBuf;
use thiserror::Error;

use crate::schema::ValueKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// A schema tree that cannot produce an unambiguous set of leaf paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Empty field name under '{parent}'")]
    EmptyName { parent: String },

    #[error("Field name '{name}' contains the path separator")]
    SeparatorInName { name: String },

    #[error("Duplicate field '{path}'")]
    DuplicateField { path: String },

    #[error("Schema nests deeper than {max} levels at '{path}' (cyclic schema?)")]
    TooDeep { path: String, max: usize },

    #[error("Two schema paths join to '{path}'")]
    AmbiguousPath { path: String },
}

/// Inconsistency between the key registry and the schema it indexes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Key {name} references '{path}', which is not a schema leaf")]
    DanglingPath { name: String, path: String },

    #[error("Key name {name} is registered twice")]
    DuplicateName { name: String },

    #[error("Path '{path}' is registered by both {first} and {second}")]
    DuplicatePath {
        path: String,
        first: String,
        second: String,
    },

    #[error("Unknown system config key: {0}")]
    UnknownKey(String),
}

/// Failure to turn a stored value back into a typed leaf value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Malformed stored value {raw:?}: {reason}")]
    Malformed { raw: String, reason: String },

    #[error("Stored value is {found}, which is not a config value")]
    Unsupported { found: &'static str },

    #[error("Expected a {expected} value, found {found}")]
    KindMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Expected a {expected} value, found null")]
    NullNotAllowed { expected: ValueKind },
}
