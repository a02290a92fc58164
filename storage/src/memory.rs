use async_trait::async_trait;
use dashmap::DashMap;
use errors::StorageError;
use tn_core::{RemoteSessionStore, Session, UserId};
use tracing::debug;

use crate::newest_first;

/// Process-local session store.
///
/// Stores whole records; `put` replaces what was there.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl RemoteSessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<Session>, StorageError> {
        Ok(self.sessions.get(session_id).map(|s| s.value().clone()))
    }

    async fn put(&self, user_id: &UserId, session: &Session) -> Result<(), StorageError> {
        let mut record = session.clone();
        record.user_id = Some(user_id.clone());
        debug!(session_id = %record.id, "Storing session in memory");
        self.sessions.insert(record.id.clone(), record);
        Ok(())
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<Session>, StorageError> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().user_id.as_ref() == Some(user_id))
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by(newest_first);
        Ok(sessions)
    }

    async fn delete(&self, session_id: &str) -> Result<(), StorageError> {
        self.sessions.remove(session_id);
        Ok(())
    }
}
