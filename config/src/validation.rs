//! # Configuration Validation
//!
//! Validation for all configuration structures using the `validator` crate.

use crate::config::Config;
use validator::Validate;

/// Validate a configuration.
///
/// ## Validation Rules
/// ### Timecode
/// - `default_fps`: one of 23.976, 24, 25, 29.97, 30, 50, 59.94, 60
/// - `zone`: "local" or "utc"
///
/// ### Sync
/// - `debounce_millis`: 0-60000
///
/// ### Tiers
/// - `free_session_limit`: 1-1000
/// - `free_note_limit`: 1-100000
///
/// ### Storage
/// - `backend`: "file" or "memory"
/// - `data_dir`: 1-4096 characters
/// - `cache_file`: 1-255 characters
///
/// ### Observability
/// - `logging_level`: "trace", "debug", "info", "warn" or "error"
pub fn validate(config: &Config) -> Result<(), validator::ValidationErrors> {
    config.validate()
}
