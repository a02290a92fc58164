//! Resolved configuration and the collaborators every command builds on.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Local, Offset, Utc};
use config::{Config, load_from_env, load_from_file, merge_configs, validate};
use session::{ControllerSettings, SessionController};
use storage::{FileCache, FileSessionStore, InMemorySessionStore, MemoryCache};
use tn_core::{LocalCache, RemoteSessionStore, SystemClock, Tier, UserId};
use tracing::{debug, warn};

use crate::commands::GlobalArgs;
use crate::ux_error;

pub type Controller = SessionController<FixedOffset>;

pub struct App {
    pub config: Config,
    pub user: UserId,
    pub tier: Tier
}

impl App {
    /// Defaults, then the config file, then `TN_*` variables, then flags.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let defaults = Config::default();
        let file = match &global.config {
            Some(path) => load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => defaults.clone()
        };
        let env = load_from_env()?;

        let cli = (global.data_dir.is_some() || global.fps.is_some()).then(|| {
            let mut overrides = Config::default();
            if let Some(dir) = &global.data_dir {
                overrides.storage.data_dir.clone_from(dir);
            }
            if let Some(fps) = global.fps {
                overrides.timecode.default_fps = fps.as_f64();
            }
            overrides
        });

        let config = merge_configs(defaults, file, "file", env, "env", cli, "cli");
        validate(&config).map_err(|e| ux_error::config_error(&e.to_string()))?;

        let user = global
            .user
            .parse::<UserId>()
            .map_err(|e| ux_error::config_error(&e))?;
        let tier = if global.pro { Tier::Pro } else { Tier::Free };

        Ok(Self { config, user, tier })
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.data_dir)
    }

    fn in_memory(&self) -> bool {
        self.config.storage.backend == "memory"
    }

    /// Calendar the clock reads its hours from. Fixed for the run.
    pub fn zone(&self) -> FixedOffset {
        if self.config.timecode.zone == "utc" {
            Utc.fix()
        } else {
            *Local::now().offset()
        }
    }

    pub async fn store(&self) -> Result<Arc<dyn RemoteSessionStore>> {
        if self.in_memory() {
            warn!("In-memory store: sessions end with this command");
            return Ok(Arc::new(InMemorySessionStore::new()));
        }
        debug!(data_dir = %self.data_dir().display(), "Opening file session store");
        let store = FileSessionStore::open(self.data_dir().join("sessions")).await?;
        Ok(Arc::new(store))
    }

    pub fn cache(&self) -> Arc<dyn LocalCache> {
        if self.in_memory() {
            Arc::new(MemoryCache::new())
        } else {
            Arc::new(FileCache::open(
                self.data_dir().join(&self.config.storage.cache_file)
            ))
        }
    }

    pub async fn controller(&self) -> Result<Controller> {
        let controller = SessionController::with_zone(
            self.user.clone(),
            self.store().await?,
            Arc::new(self.tier),
            Arc::new(SystemClock),
            ControllerSettings::from_config(&self.config),
            self.zone()
        )
        .with_cache(self.cache());
        Ok(controller)
    }

    /// Controller with `session_id` loaded, or the newest session (creating
    /// the first one) when no id is given.
    pub async fn open(&self, session_id: Option<&str>) -> Result<Controller> {
        let mut controller = self.controller().await?;
        match session_id {
            Some(id) => {
                if controller
                    .load_session(id)
                    .await
                    .map_err(ux_error::from_session)?
                    .is_none()
                {
                    return Err(ux_error::session_not_found(id).into());
                }
            }
            None => {
                controller
                    .bootstrap()
                    .await
                    .map_err(ux_error::from_session)?;
            }
        }
        Ok(controller)
    }
}

/// Flushes pending changes and reports a failed write.
pub async fn finish(mut controller: Controller) -> Result<()> {
    if let Some(report) = controller.close().await {
        if let Err(e) = report.result {
            return Err(ux_error::save_failed(&e.to_string()).into());
        }
    }
    Ok(())
}
