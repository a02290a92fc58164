use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use storage::FileSessionStore;
use sync::{
    ConnectivityTracker, ReconcileOutcome, SaveDebouncer, SessionPersister, SessionReconciler,
    SyncState, Transition
};
use testing::{FlakyStore, ManualClock, note, session, shoot_day, user};
use tn_core::{Connectivity, RemoteSessionStore};

#[tokio::test]
async fn test_offline_edits_reach_store_after_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let files = FileSessionStore::open(dir.path()).await.unwrap();
    let store = Arc::new(FlakyStore::wrap(files));
    let clock = ManualClock::at(shoot_day());
    let persister = Arc::new(SessionPersister::new(store.clone(), user("u1"), clock.clone()));
    let (mut debouncer, mut reports) = SaveDebouncer::new(persister.clone(), Duration::from_millis(20));
    let reconciler = SessionReconciler::new(persister, clock.clone());
    let mut tracker = ConnectivityTracker::default();

    // Another device already saved note C.
    store
        .seed(
            &user("u1"),
            &session("session_1", vec![note("note_a", "10:00:00:00"), note("note_c", "10:02:00:00")])
        )
        .await
        .unwrap();

    store.set_online(false);
    assert_eq!(tracker.observe(Connectivity::Offline), Transition::WentOffline);

    let local = session(
        "session_1",
        vec![note("note_a", "10:00:00:00"), note("note_b", "10:05:00:00")]
    );
    debouncer.schedule(local.clone());
    let report = tokio::time::timeout(Duration::from_secs(2), reports.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(!report.is_saved());

    store.set_online(true);
    assert_eq!(tracker.observe(Connectivity::Online), Transition::Reconnected);

    let ReconcileOutcome::Reconciled(result) = reconciler
        .reconcile_on_reconnect(&local, &BTreeSet::new())
        .await
    else {
        panic!("expected reconciliation");
    };
    assert!(result.persisted.is_saved());
    assert_eq!(
        result.notice.unwrap().introduced_note_ids,
        vec!["note_c".to_string()]
    );

    let stored = store.inner().get("session_1").await.unwrap().unwrap();
    let ids: Vec<&str> = stored.notes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["note_a", "note_c", "note_b"]);
}

#[tokio::test]
async fn test_deleted_note_stays_deleted_across_reconnect() {
    let store = FlakyStore::in_memory();
    let clock = ManualClock::at(shoot_day());
    let persister = Arc::new(SessionPersister::new(store.clone(), user("u1"), clock.clone()));
    let reconciler = SessionReconciler::new(persister, clock);

    store
        .seed(&user("u1"), &session("session_1", vec![note("note_a", "10:00:00:00")]))
        .await
        .unwrap();

    let mut state = SyncState::new("session_1");
    state.record_deletion("note_a");
    let local = session(
        "session_1",
        vec![testing::tombstone("note_a", "10:00:00:00"), note("note_b", "10:01:00:00")]
    );

    let ReconcileOutcome::Reconciled(result) = reconciler
        .reconcile_on_reconnect(&local, &state.deleted_ids)
        .await
    else {
        panic!("expected reconciliation");
    };

    let visible: Vec<&str> = result.merged.visible_notes().map(|n| n.id.as_str()).collect();
    assert_eq!(visible, vec!["note_b"]);
    let stored = store.inner().get("session_1").await.unwrap().unwrap();
    assert!(stored.note("note_a").unwrap().deleted);
}
