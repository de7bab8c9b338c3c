//! sysconf override store.
//!
//! This crate persists per-key configuration overrides and applies them:
//! - `system_config` table access over `SQLite` or PostgreSQL
//! - Kind-checked writes against the key registry
//! - Reads that fall back to base values on corrupt rows
//! - Pruning of rows for retired keys

pub mod db;
pub mod error;
pub mod service;

pub use db::{ConfigStore, SystemConfigRow};
pub use error::StoreError;
pub use service::{Overrides, RejectedRow, RowProblem, SystemConfigService};
