use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use errors::StorageError;
use tn_core::{RemoteSessionStore, Session, UserId};
use tracing::{debug, warn};

use crate::newest_first;

const BACKEND: &str = "file";

/// Session store backed by one JSON file per session in a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never sees a half-written record.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf
}

fn read_failed(reason: impl ToString) -> StorageError {
    StorageError::ReadFailed {
        backend: BACKEND.to_string(),
        reason: reason.to_string()
    }
}

fn write_failed(reason: impl ToString) -> StorageError {
    StorageError::WriteFailed {
        backend: BACKEND.to_string(),
        reason: reason.to_string()
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl FileSessionStore {
    /// Opens the store, creating `root` if needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::Unavailable {
                backend: BACKEND.to_string(),
                reason: format!("{}: {e}", root.display())
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_id(session_id) {
            return Err(StorageError::NotFound {
                backend: BACKEND.to_string(),
                id: session_id.to_string()
            });
        }
        Ok(self.root.join(format!("{session_id}.json")))
    }

    async fn read_record(path: &Path) -> Result<Option<Session>, StorageError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_failed(e))
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StorageError::SerializationError {
                error_type: "json".to_string(),
                reason: format!("{}: {e}", path.display())
            })
    }
}

#[async_trait]
impl RemoteSessionStore for FileSessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<Session>, StorageError> {
        let path = self.path_for(session_id)?;
        Self::read_record(&path).await
    }

    async fn put(&self, user_id: &UserId, session: &Session) -> Result<(), StorageError> {
        let path = self.path_for(&session.id)?;
        let mut record = session.clone();
        record.user_id = Some(user_id.clone());

        let data = serde_json::to_vec_pretty(&record).map_err(|e| {
            StorageError::SerializationError {
                error_type: "json".to_string(),
                reason: e.to_string()
            }
        })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await.map_err(write_failed)?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(write_failed)?;

        debug!(session_id = %record.id, path = %path.display(), "Session written");
        Ok(())
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<Session>, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(read_failed)?;
        let mut sessions = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(Some(session)) if session.user_id.as_ref() == Some(user_id) => {
                    sessions.push(session);
                }
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable session file")
            }
        }

        sessions.sort_by(newest_first);
        Ok(sessions)
    }

    async fn delete(&self, session_id: &str) -> Result<(), StorageError> {
        let path = self.path_for(session_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(write_failed(e))
        }
    }
}
