//! # Configuration Structures
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Fall back to defaults for every omitted field

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Frame rates the timecode engine can run at.
pub const SUPPORTED_FRAME_RATES: [f64; 8] = [23.976, 24.0, 25.0, 29.97, 30.0, 50.0, 59.94, 60.0];

/// Main configuration structure.
///
/// ## Usage
/// ```rust,no_run
/// use config::Config;
///
/// let config = Config::default();
/// println!("Save debounce: {} ms", config.sync.debounce_millis);
/// ```
///
/// ## Fields
/// - `timecode`: default frame rate and display zone
/// - `sync`: save debounce and reconnect behavior
/// - `tiers`: free-tier limits
/// - `storage`: where sessions and the local cache live
/// - `observability`: logging level and metrics switch
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    #[validate(nested)]
    pub timecode: TimecodeConfig,

    #[serde(default)]
    #[validate(nested)]
    pub sync: SyncConfig,

    #[serde(default)]
    #[validate(nested)]
    pub tiers: TierConfig,

    #[serde(default)]
    #[validate(nested)]
    pub storage: StorageConfig,

    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig
}

/// Timecode engine configuration.
///
/// ## Fields
/// - `default_fps`: frame rate for new sessions (default: 25)
/// - `zone`: `local` or `utc`, the calendar the clock displays (default:
///   "local")
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct TimecodeConfig {
    #[serde(default = "default_fps")]
    #[validate(custom(function = "validate_frame_rate"))]
    pub default_fps: f64,

    #[serde(default = "default_zone")]
    #[validate(custom(function = "validate_zone"))]
    pub zone: String
}

fn default_fps() -> f64 {
    25.0
}

fn default_zone() -> String {
    "local".to_string()
}

fn validate_frame_rate(value: f64) -> Result<(), validator::ValidationError> {
    if SUPPORTED_FRAME_RATES
        .iter()
        .any(|fps| (fps - value).abs() < 1e-6)
    {
        Ok(())
    } else {
        Err(validator::ValidationError::new("Unsupported frame rate"))
    }
}

fn validate_zone(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "local" | "utc" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid timecode zone"))
    }
}

impl Default for TimecodeConfig {
    fn default() -> Self {
        Self {
            default_fps: default_fps(),
            zone: default_zone()
        }
    }
}

/// Session synchronization configuration.
///
/// ## Fields
/// - `debounce_millis`: quiet period after the last change before the
///   session is written (default: 2000, range: 0-60000)
/// - `reconcile_on_reconnect`: fetch and merge the remote copy when
///   connectivity returns (default: true)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SyncConfig {
    #[serde(default = "default_debounce_millis")]
    #[validate(range(min = 0, max = 60000))]
    pub debounce_millis: u64,

    #[serde(default = "default_reconcile_on_reconnect")]
    pub reconcile_on_reconnect: bool
}

fn default_debounce_millis() -> u64 {
    2000
}

fn default_reconcile_on_reconnect() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_millis: default_debounce_millis(),
            reconcile_on_reconnect: default_reconcile_on_reconnect()
        }
    }
}

/// Free-tier limits. Pro users are unlimited.
///
/// ## Fields
/// - `free_session_limit`: sessions a free user may own (default: 1)
/// - `free_note_limit`: live notes per session for a free user (default: 20)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct TierConfig {
    #[serde(default = "default_free_session_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub free_session_limit: usize,

    #[serde(default = "default_free_note_limit")]
    #[validate(range(min = 1, max = 100000))]
    pub free_note_limit: usize
}

fn default_free_session_limit() -> usize {
    1
}

fn default_free_note_limit() -> usize {
    20
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            free_session_limit: default_free_session_limit(),
            free_note_limit: default_free_note_limit()
        }
    }
}

/// Storage configuration.
///
/// ## Fields
/// - `backend`: `file` or `memory` (default: "file")
/// - `data_dir`: directory holding session records (default: ".takenote")
/// - `cache_file`: local cache file name inside `data_dir` (default:
///   "cache.json")
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    #[validate(custom(function = "validate_backend"))]
    pub backend: String,

    #[serde(default = "default_data_dir")]
    #[validate(length(min = 1, max = 4096))]
    pub data_dir: String,

    #[serde(default = "default_cache_file")]
    #[validate(length(min = 1, max = 255))]
    pub cache_file: String
}

fn default_backend() -> String {
    "file".to_string()
}

fn default_data_dir() -> String {
    ".takenote".to_string()
}

fn default_cache_file() -> String {
    "cache.json".to_string()
}

fn validate_backend(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "file" | "memory" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid storage backend"))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
            cache_file: default_cache_file()
        }
    }
}

/// Observability configuration.
///
/// ## Fields
/// - `metrics_enabled`: record counters through the `metrics` facade
///   (default: true)
/// - `logging_level`: log level (default: "info")
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    #[serde(default = "default_logging_level")]
    #[validate(custom(function = "validate_logging_level"))]
    pub logging_level: String
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

fn validate_logging_level(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid logging level"))
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
            logging_level: default_logging_level()
        }
    }
}
