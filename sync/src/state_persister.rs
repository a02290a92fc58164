use std::sync::Arc;

use tn_core::LocalCache;

use crate::error::{Result, SyncError};
use crate::state::SyncState;

pub trait SyncStatePersister: Send + Sync {
    /// Stored state for `session_id`, or a fresh state if none was saved.
    fn load(&self, session_id: &str) -> Result<SyncState>;

    fn save(&self, state: &SyncState) -> Result<()>;
}

/// Keeps one JSON document per session in the local cache.
pub struct CachePersister {
    cache: Arc<dyn LocalCache>,
    prefix: String
}

impl CachePersister {
    pub fn new(cache: Arc<dyn LocalCache>) -> Self {
        Self::with_prefix(cache, "sync_state")
    }

    pub fn with_prefix(cache: Arc<dyn LocalCache>, prefix: &str) -> Self {
        Self {
            cache,
            prefix: prefix.to_string()
        }
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}:{}", self.prefix, session_id)
    }
}

impl SyncStatePersister for CachePersister {
    fn load(&self, session_id: &str) -> Result<SyncState> {
        match self.cache.get(&self.key(session_id)) {
            Some(data) => {
                let state: SyncState = serde_json::from_str(&data)?;
                if state.session_id != session_id {
                    return Err(SyncError::Persistence(format!(
                        "state under {} belongs to {}",
                        self.key(session_id),
                        state.session_id
                    )));
                }
                Ok(state)
            }
            None => Ok(SyncState::new(session_id))
        }
    }

    fn save(&self, state: &SyncState) -> Result<()> {
        let data = serde_json::to_string(state)?;
        self.cache.set(&self.key(&state.session_id), &data)?;
        Ok(())
    }
}
