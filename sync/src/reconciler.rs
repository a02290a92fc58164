use std::collections::BTreeSet;
use std::sync::Arc;

use errors::StorageError;
use tn_core::{Clock, Session};
use tracing::{info, warn};

use crate::merge::{MergeConflictNotice, merge_sessions};
use crate::persister::{PersistReport, SessionPersister};

#[derive(Debug)]
pub enum ReconcileOutcome {
    /// The remote copy could not be read. Local state is authoritative
    /// until the next reconnect.
    FetchFailed(StorageError),
    Reconciled(Reconciliation)
}

#[derive(Debug)]
pub struct Reconciliation {
    /// Merged record. `updated_at` is the persist stamp when the write
    /// succeeded, the merge time otherwise.
    pub merged: Session,
    pub notice: Option<MergeConflictNotice>,
    pub persisted: PersistReport
}

impl Reconciliation {
    /// Whether the caller should replace its local notes with the merged ones.
    pub fn introduces_notes(&self) -> bool {
        self.notice.is_some()
    }
}

/// Fetches the remote copy of a session after a reconnect, merges it with
/// the local copy and writes the result back.
pub struct SessionReconciler {
    persister: Arc<SessionPersister>,
    clock: Arc<dyn Clock>
}

impl SessionReconciler {
    pub fn new(persister: Arc<SessionPersister>, clock: Arc<dyn Clock>) -> Self {
        Self { persister, clock }
    }

    #[tracing::instrument(skip(self, local, deleted_ids), fields(session_id = %local.id))]
    pub async fn reconcile_on_reconnect(
        &self,
        local: &Session,
        deleted_ids: &BTreeSet<String>
    ) -> ReconcileOutcome {
        metrics::counter!("takenote_reconcile_total").increment(1);

        let remote = match self.persister.store().get(&local.id).await {
            Ok(remote) => remote,
            Err(e) => {
                metrics::counter!("takenote_reconcile_fetch_failed_total").increment(1);
                warn!(error = %e, "Reconcile fetch failed, keeping local session");
                return ReconcileOutcome::FetchFailed(e);
            }
        };

        let merged = merge_sessions(Some(local), remote.as_ref(), deleted_ids, self.clock.now())
            .map_or_else(
                || (local.clone(), None),
                |m| (m.session, m.notice)
            );
        let (mut session, notice) = merged;

        if let Some(notice) = &notice {
            metrics::counter!("takenote_merge_notes_introduced_total")
                .increment(notice.introduced_note_ids.len() as u64);
            info!(
                introduced = notice.introduced_note_ids.len(),
                "Merge introduced notes from another device"
            );
        }

        let persisted = self.persister.persist(session.clone()).await;
        if let Some(at) = persisted.saved_at() {
            session.updated_at = Some(at);
        }

        ReconcileOutcome::Reconciled(Reconciliation {
            merged: session,
            notice,
            persisted
        })
    }
}
