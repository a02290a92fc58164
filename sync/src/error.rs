use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] errors::StorageError),
    #[error("State persistence failed: {0}")]
    Persistence(String)
}

pub type Result<T> = std::result::Result<T, SyncError>;
