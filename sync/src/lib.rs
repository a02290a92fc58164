//! # Session Sync
//!
//! Offline-tolerant persistence of session records: a debounced writer, a
//! deterministic merge of local and remote copies, and reconciliation when
//! connectivity returns.

pub mod connectivity;
pub mod debounce;
pub mod error;
pub mod merge;
pub mod persister;
pub mod reconciler;
pub mod state;
pub mod state_persister;

#[cfg(test)]
mod proptests;

pub use connectivity::{ConnectivityTracker, Transition};
pub use debounce::SaveDebouncer;
pub use error::{Result, SyncError};
pub use merge::{MergeConflictNotice, MergedSession, merge_pair, merge_sessions};
pub use persister::{PersistReport, SessionPersister};
pub use reconciler::{ReconcileOutcome, Reconciliation, SessionReconciler};
pub use state::{PersistFailure, SyncState, SyncStats};
pub use state_persister::{CachePersister, SyncStatePersister};
