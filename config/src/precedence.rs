//! # Configuration Precedence
//!
//! Merges configuration from multiple sources with precedence rules.
//!
//! # Precedence Order
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values (lowest priority)
//!
//! A field in an override source only wins when it differs from the default,
//! so a source that leaves a field unset never clobbers a lower source.

use std::fmt::Display;

use crate::config::{
    Config, ObservabilityConfig, StorageConfig, SyncConfig, TierConfig, TimecodeConfig
};

/// Merge multiple configuration sources with precedence.
///
/// ```rust,no_run
/// use config::{Config, load_from_env, load_from_file, merge_configs};
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let merged = merge_configs(
///         Config::default(),
///         load_from_file(Path::new("takenote.toml"))?,
///         "file",
///         load_from_env()?,
///         "env",
///         None,
///         "cli"
///     );
///     println!("debounce: {}", merged.sync.debounce_millis);
///     Ok(())
/// }
/// ```
pub fn merge_configs(
    defaults: Config,
    file_config: Config,
    file_source_name: &str,
    env_config: Config,
    env_source_name: &str,
    cli_config: Option<Config>,
    cli_source_name: &str
) -> Config {
    let mut config = defaults;

    config = merge_with_logging(config, &file_config, file_source_name);
    config = merge_with_logging(config, &env_config, env_source_name);

    if let Some(cli) = cli_config {
        config = merge_with_logging(config, &cli, cli_source_name);
    }

    config
}

fn merge_with_logging(mut base: Config, override_config: &Config, source_name: &str) -> Config {
    let mut changes = Vec::new();

    merge_timecode(&mut base.timecode, &override_config.timecode, &mut changes);
    merge_sync(&mut base.sync, &override_config.sync, &mut changes);
    merge_tiers(&mut base.tiers, &override_config.tiers, &mut changes);
    merge_storage(&mut base.storage, &override_config.storage, &mut changes);
    merge_observability(
        &mut base.observability,
        &override_config.observability,
        &mut changes
    );

    if !changes.is_empty() {
        tracing::info!("Configuration from {}: {:?}", source_name, changes);
    }

    base
}

fn apply<T: PartialEq + Clone + Display>(
    name: &str,
    base: &mut T,
    value: &T,
    default: &T,
    changes: &mut Vec<String>
) {
    if value != default && value != base {
        changes.push(format!("{name} = {value}"));
        base.clone_from(value);
    }
}

fn merge_timecode(base: &mut TimecodeConfig, over: &TimecodeConfig, changes: &mut Vec<String>) {
    let d = TimecodeConfig::default();
    apply(
        "timecode.default_fps",
        &mut base.default_fps,
        &over.default_fps,
        &d.default_fps,
        changes
    );
    apply("timecode.zone", &mut base.zone, &over.zone, &d.zone, changes);
}

fn merge_sync(base: &mut SyncConfig, over: &SyncConfig, changes: &mut Vec<String>) {
    let d = SyncConfig::default();
    apply(
        "sync.debounce_millis",
        &mut base.debounce_millis,
        &over.debounce_millis,
        &d.debounce_millis,
        changes
    );
    apply(
        "sync.reconcile_on_reconnect",
        &mut base.reconcile_on_reconnect,
        &over.reconcile_on_reconnect,
        &d.reconcile_on_reconnect,
        changes
    );
}

fn merge_tiers(base: &mut TierConfig, over: &TierConfig, changes: &mut Vec<String>) {
    let d = TierConfig::default();
    apply(
        "tiers.free_session_limit",
        &mut base.free_session_limit,
        &over.free_session_limit,
        &d.free_session_limit,
        changes
    );
    apply(
        "tiers.free_note_limit",
        &mut base.free_note_limit,
        &over.free_note_limit,
        &d.free_note_limit,
        changes
    );
}

fn merge_storage(base: &mut StorageConfig, over: &StorageConfig, changes: &mut Vec<String>) {
    let d = StorageConfig::default();
    apply("storage.backend", &mut base.backend, &over.backend, &d.backend, changes);
    apply("storage.data_dir", &mut base.data_dir, &over.data_dir, &d.data_dir, changes);
    apply(
        "storage.cache_file",
        &mut base.cache_file,
        &over.cache_file,
        &d.cache_file,
        changes
    );
}

fn merge_observability(
    base: &mut ObservabilityConfig,
    over: &ObservabilityConfig,
    changes: &mut Vec<String>
) {
    let d = ObservabilityConfig::default();
    apply(
        "observability.metrics_enabled",
        &mut base.metrics_enabled,
        &over.metrics_enabled,
        &d.metrics_enabled,
        changes
    );
    apply(
        "observability.logging_level",
        &mut base.logging_level,
        &over.logging_level,
        &d.logging_level,
        changes
    );
}
