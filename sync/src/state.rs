use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-session bookkeeping that survives across persists and reconnects.
///
/// `deleted_ids` holds every note id deleted in this session. It is never
/// pruned while the session is open, so a tombstone stays authoritative over
/// any later remote copy that still carries the note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub version: String,
    pub session_id: String,
    #[serde(default)]
    pub deleted_ids: BTreeSet<String>,
    pub last_persisted_at: Option<DateTime<Utc>>,
    pub last_reconciled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_failure: Option<PersistFailure>,
    #[serde(default)]
    pub stats: SyncStats
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistFailure {
    pub error: String,
    pub failed_at: DateTime<Utc>,
    pub retry_count: u32
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub total_persists: u64,
    pub failed_persists: u64,
    pub total_reconciles: u64,
    pub failed_fetches: u64,
    pub notes_introduced: u64
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            session_id: String::new(),
            deleted_ids: BTreeSet::new(),
            last_persisted_at: None,
            last_reconciled_at: None,
            last_failure: None,
            stats: SyncStats::default()
        }
    }
}

impl SyncState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    /// Returns `false` if the id was already tombstoned.
    pub fn record_deletion(&mut self, note_id: &str) -> bool {
        self.deleted_ids.insert(note_id.to_string())
    }

    pub fn is_deleted(&self, note_id: &str) -> bool {
        self.deleted_ids.contains(note_id)
    }

    pub fn record_persisted(&mut self, at: DateTime<Utc>) {
        self.last_persisted_at = Some(at);
        self.last_failure = None;
        self.stats.total_persists += 1;
    }

    pub fn record_persist_failure(&mut self, error: &str, at: DateTime<Utc>) {
        let retry_count = self.last_failure.as_ref().map_or(0, |f| f.retry_count + 1);
        self.last_failure = Some(PersistFailure {
            error: error.to_string(),
            failed_at: at,
            retry_count
        });
        self.stats.failed_persists += 1;
    }

    pub fn record_reconciled(&mut self, at: DateTime<Utc>, introduced: usize) {
        self.last_reconciled_at = Some(at);
        self.stats.total_reconciles += 1;
        self.stats.notes_introduced += introduced as u64;
    }

    pub fn record_fetch_failure(&mut self) {
        self.stats.failed_fetches += 1;
    }

    /// A save failed and has not been superseded by a successful one.
    pub fn has_unsaved_changes(&self) -> bool {
        self.last_failure.is_some()
    }
}
