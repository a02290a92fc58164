//! # Environment Variable Loader
//!
//! Loads configuration from `TN_*` environment variables. Unset variables
//! fall back to defaults; set but unparsable ones are errors.

use crate::config::{
    Config, ObservabilityConfig, StorageConfig, SyncConfig, TierConfig, TimecodeConfig
};
use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigEnvError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String }
}

/// Load configuration from environment variables.
///
/// ## Environment Variables
/// - `TN_DEFAULT_FPS`: frame rate for new sessions (default: 25)
/// - `TN_TIMEZONE`: `local` or `utc` (default: "local")
/// - `TN_DEBOUNCE_MS`: save debounce in milliseconds (default: 2000)
/// - `TN_RECONCILE_ON_RECONNECT`: true/false (default: true)
/// - `TN_FREE_SESSION_LIMIT`: free-tier session limit (default: 1)
/// - `TN_FREE_NOTE_LIMIT`: free-tier note limit per session (default: 20)
/// - `TN_STORAGE_BACKEND`: `file` or `memory` (default: "file")
/// - `TN_DATA_DIR`: session directory (default: ".takenote")
/// - `TN_CACHE_FILE`: local cache file name (default: "cache.json")
/// - `TN_METRICS_ENABLED`: true/false (default: true)
/// - `TN_LOG_LEVEL`: trace/debug/info/warn/error (default: "info")
pub fn load_from_env() -> Result<Config, ConfigEnvError> {
    Ok(Config {
        timecode: load_timecode_from_env()?,
        sync: load_sync_from_env()?,
        tiers: load_tiers_from_env()?,
        storage: load_storage_from_env(),
        observability: load_observability_from_env()?
    })
}

fn load_timecode_from_env() -> Result<TimecodeConfig, ConfigEnvError> {
    let defaults = TimecodeConfig::default();
    Ok(TimecodeConfig {
        default_fps: parse_env("TN_DEFAULT_FPS")?.unwrap_or(defaults.default_fps),
        zone: env::var("TN_TIMEZONE").unwrap_or(defaults.zone)
    })
}

fn load_sync_from_env() -> Result<SyncConfig, ConfigEnvError> {
    let defaults = SyncConfig::default();
    Ok(SyncConfig {
        debounce_millis: parse_env("TN_DEBOUNCE_MS")?.unwrap_or(defaults.debounce_millis),
        reconcile_on_reconnect: parse_env("TN_RECONCILE_ON_RECONNECT")?
            .unwrap_or(defaults.reconcile_on_reconnect)
    })
}

fn load_tiers_from_env() -> Result<TierConfig, ConfigEnvError> {
    let defaults = TierConfig::default();
    Ok(TierConfig {
        free_session_limit: parse_env("TN_FREE_SESSION_LIMIT")?
            .unwrap_or(defaults.free_session_limit),
        free_note_limit: parse_env("TN_FREE_NOTE_LIMIT")?.unwrap_or(defaults.free_note_limit)
    })
}

fn load_storage_from_env() -> StorageConfig {
    let defaults = StorageConfig::default();
    StorageConfig {
        backend: env::var("TN_STORAGE_BACKEND").unwrap_or(defaults.backend),
        data_dir: env::var("TN_DATA_DIR").unwrap_or(defaults.data_dir),
        cache_file: env::var("TN_CACHE_FILE").unwrap_or(defaults.cache_file)
    }
}

fn load_observability_from_env() -> Result<ObservabilityConfig, ConfigEnvError> {
    let defaults = ObservabilityConfig::default();
    Ok(ObservabilityConfig {
        metrics_enabled: parse_env("TN_METRICS_ENABLED")?.unwrap_or(defaults.metrics_enabled),
        logging_level: env::var("TN_LOG_LEVEL").unwrap_or(defaults.logging_level)
    })
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigEnvError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigEnvError::Invalid {
                key: key.to_string(),
                value
            }),
        Err(_) => Ok(None)
    }
}
