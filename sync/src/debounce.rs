use std::sync::Arc;
use std::time::Duration;

use tn_core::Session;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::persister::{PersistReport, SessionPersister};

/// Coalesces bursts of session changes into one remote write.
///
/// Each `schedule` cancels the pending write and starts a new delay with the
/// latest snapshot. When the delay elapses the snapshot is persisted and the
/// report is sent on the channel returned by [`SaveDebouncer::new`].
pub struct SaveDebouncer {
    delay: Duration,
    persister: Arc<SessionPersister>,
    reports: mpsc::UnboundedSender<PersistReport>,
    pending: Option<JoinHandle<()>>
}

impl SaveDebouncer {
    pub fn new(
        persister: Arc<SessionPersister>,
        delay: Duration
    ) -> (Self, mpsc::UnboundedReceiver<PersistReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                persister,
                reports: tx,
                pending: None
            },
            rx
        )
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn persister(&self) -> &Arc<SessionPersister> {
        &self.persister
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Replaces any pending write with one for `snapshot`.
    pub fn schedule(&mut self, snapshot: Session) {
        self.cancel();

        let Ok(runtime) = Handle::try_current() else {
            warn!(session_id = %snapshot.id, "No async runtime, save not scheduled");
            return;
        };

        let persister = Arc::clone(&self.persister);
        let reports = self.reports.clone();
        let delay = self.delay;
        debug!(session_id = %snapshot.id, delay_ms = delay.as_millis() as u64, "Save scheduled");

        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let report = persister.persist(snapshot).await;
            if reports.send(report).is_err() {
                debug!("Persist report dropped, receiver closed");
            }
        }));
    }

    /// Cancels any pending write and persists `snapshot` now.
    pub async fn flush(&mut self, snapshot: Session) -> PersistReport {
        self.cancel();
        self.persister.persist(snapshot).await
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for SaveDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testing::{FlakyStore, ManualClock, note, session, shoot_day, user};

    fn debouncer(store: Arc<FlakyStore>, delay_ms: u64) -> (SaveDebouncer, mpsc::UnboundedReceiver<PersistReport>) {
        let persister = SessionPersister::new(store, user("u1"), ManualClock::at(shoot_day()));
        SaveDebouncer::new(Arc::new(persister), Duration::from_millis(delay_ms))
    }

    #[tokio::test]
    async fn test_burst_persists_only_last_snapshot() {
        let store = FlakyStore::in_memory();
        let (mut debouncer, mut reports) = debouncer(store.clone(), 50);

        let mut s = session("session_1", vec![]);
        for i in 0..5 {
            s.notes.push(note(&format!("note_{i}"), "10:00:00:00"));
            debouncer.schedule(s.clone());
        }
        assert!(debouncer.is_pending());

        let report = tokio::time::timeout(Duration::from_secs(2), reports.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(report.is_saved());
        assert_eq!(store.put_count(), 1);
        assert_eq!(store.last_put().unwrap().notes.len(), 5);
    }

    #[tokio::test]
    async fn test_cancel_drops_pending_write() {
        let store = FlakyStore::in_memory();
        let (mut debouncer, _reports) = debouncer(store.clone(), 30);

        debouncer.schedule(session("session_1", vec![]));
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.put_count(), 0);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test]
    async fn test_flush_writes_immediately_and_cancels_pending() {
        let store = FlakyStore::in_memory();
        let (mut debouncer, _reports) = debouncer(store.clone(), 1_000);

        debouncer.schedule(session("session_1", vec![]));
        let report = debouncer
            .flush(session("session_1", vec![note("note_1", "01:00:00:00")]))
            .await;

        assert_eq!(report.saved_at(), Some(shoot_day()));
        assert_eq!(store.put_count(), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test]
    async fn test_failed_write_is_reported() {
        let store = FlakyStore::in_memory();
        store.set_online(false);
        let (mut debouncer, mut reports) = debouncer(store.clone(), 10);

        debouncer.schedule(session("session_1", vec![]));
        let report = tokio::time::timeout(Duration::from_secs(2), reports.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(!report.is_saved());
        assert_eq!(store.put_count(), 0);
    }

    #[test]
    fn test_schedule_without_runtime_is_a_no_op() {
        let store = FlakyStore::in_memory();
        let (mut debouncer, _reports) = debouncer(store, 10);
        debouncer.schedule(session("session_1", vec![]));
        assert!(!debouncer.is_pending());
    }
}
