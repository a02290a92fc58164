use std::time::Duration;

use config::{Config, TierConfig};
use tn_core::FrameRate;
use tracing::warn;

/// The parts of [`Config`] the controller reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub debounce: Duration,
    pub reconcile_on_reconnect: bool,
    pub tiers: TierConfig,
    pub default_fps: FrameRate
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        let default_fps = FrameRate::from_f64(config.timecode.default_fps).unwrap_or_else(|| {
            warn!(
                fps = config.timecode.default_fps,
                "Unsupported default frame rate, using 25"
            );
            FrameRate::Fps25
        });

        Self {
            debounce: Duration::from_millis(config.sync.debounce_millis),
            reconcile_on_reconnect: config.sync.reconcile_on_reconnect,
            tiers: config.tiers.clone(),
            default_fps
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}
