//! Collaborator traits at the boundary of the session engine

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use errors::StorageError;

use crate::types::{Session, Tier, UserId};

/// Remote key-value store of session records, keyed by session id.
///
/// `put` is an upsert of the complete record. Implementations must not merge
/// fields at the storage layer; the reconciler owns all merging.
#[async_trait]
pub trait RemoteSessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<Session>, StorageError>;

    async fn put(&self, user_id: &UserId, session: &Session) -> Result<(), StorageError>;

    /// Sessions owned by `user_id`, newest `createdAt` first.
    async fn list(&self, user_id: &UserId) -> Result<Vec<Session>, StorageError>;

    async fn delete(&self, session_id: &str) -> Result<(), StorageError>;
}

/// Best-effort local string storage.
///
/// Callers log and swallow `set` failures; they never become core errors.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Entitlement lookups from already-resolved state. Must not block.
pub trait EntitlementProvider: Send + Sync {
    fn is_pro(&self, user_id: &UserId) -> bool;

    fn tier(&self, user_id: &UserId) -> Tier {
        if self.is_pro(user_id) { Tier::Pro } else { Tier::Free }
    }
}

/// Fixed entitlement, for single-user tools and tests.
impl EntitlementProvider for Tier {
    fn is_pro(&self, _user_id: &UserId) -> bool {
        *self == Tier::Pro
    }
}

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
