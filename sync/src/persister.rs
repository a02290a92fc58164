use std::sync::Arc;

use chrono::{DateTime, Utc};
use errors::StorageError;
use tn_core::{Clock, RemoteSessionStore, Session, UserId};
use tracing::{debug, warn};

/// Result of one attempt to write a session snapshot to the remote store.
///
/// Delivered back to the session owner, which applies `updated_at` on
/// success. A failure leaves the local session untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistReport {
    pub session_id: String,
    pub result: Result<DateTime<Utc>, StorageError>
}

impl PersistReport {
    pub fn is_saved(&self) -> bool {
        self.result.is_ok()
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.result.as_ref().ok().copied()
    }
}

/// Writes whole session records for one user.
pub struct SessionPersister {
    store: Arc<dyn RemoteSessionStore>,
    user_id: UserId,
    clock: Arc<dyn Clock>
}

impl SessionPersister {
    pub fn new(store: Arc<dyn RemoteSessionStore>, user_id: UserId, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            user_id,
            clock
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn store(&self) -> &Arc<dyn RemoteSessionStore> {
        &self.store
    }

    /// Stamps `updated_at` and upserts the snapshot.
    #[tracing::instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn persist(&self, mut session: Session) -> PersistReport {
        let stamped = self.clock.now();
        session.updated_at = Some(stamped);
        session.user_id = Some(self.user_id.clone());

        let result = match self.store.put(&self.user_id, &session).await {
            Ok(()) => {
                metrics::counter!("takenote_persist_saved_total").increment(1);
                debug!(notes = session.notes.len(), "Session persisted");
                Ok(stamped)
            }
            Err(e) => {
                metrics::counter!("takenote_persist_failed_total").increment(1);
                warn!(error = %e, "Session persist failed, will retry on next change or reconnect");
                Err(e)
            }
        };

        PersistReport {
            session_id: session.id,
            result
        }
    }
}
