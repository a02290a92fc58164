//! # Configuration System
//!
//! Configuration for the TakeNote engine and the `takenote` binary.
//!
//! This crate provides:
//! - Configuration structures for timecode, sync, tier limits, storage and
//!   observability
//! - Environment variable loading (`TN_*`)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (CLI > env > file > defaults)
//! - Configuration validation

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validation;

pub use config::{
    Config, ObservabilityConfig, StorageConfig, SyncConfig, TierConfig, TimecodeConfig
};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::{ConfigEnvError, load_from_env};
pub use precedence::merge_configs;
pub use validation::validate;
pub use validator::Validate;
