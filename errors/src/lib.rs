//! # TakeNote Errors
//!
//! Error taxonomy shared by the timecode engine, the session reconciler and
//! the session controller.
//!
//! - `thiserror` derives for every enum
//! - named fields in messages so the rendered text stays stable
//! - no variant carries a boxed source, errors cross async boundaries freely

use thiserror::Error;

/// An attempted action violates a required-field or range constraint.
///
/// Reported synchronously; the state the action targeted is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Note text must not be empty")]
    EmptyNoteText,

    #[error("Session name must not be empty")]
    EmptySessionName,

    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    #[error("Note {id} is deleted and can no longer be edited")]
    NoteDeleted { id: String },

    #[error("Mic channel not found: {number}")]
    MicNotFound { number: u32 },

    #[error("Metadata field not found: {id}")]
    FieldNotFound { id: String },

    #[error("No long note is being recorded")]
    NoOpenLongNote,

    #[error("No session is loaded")]
    NoCurrentSession,

    #[error("Session not found: {id}")]
    SessionNotFound { id: String }
}

/// Remote or local storage failures.
///
/// Background saves log these and retry on the next debounce or reconnect.
/// Only user-initiated actions surface them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Store {backend} is unreachable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("Read from {backend} failed: {reason}")]
    ReadFailed { backend: String, reason: String },

    #[error("Write to {backend} failed: {reason}")]
    WriteFailed { backend: String, reason: String },

    #[error("Serialization error: {error_type} - {reason}")]
    SerializationError { error_type: String, reason: String },

    #[error("Not found on {backend}:{id}")]
    NotFound { backend: String, id: String }
}

/// Timecode parsing and engine state errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimecodeError {
    #[error("Malformed timecode: {input}")]
    Malformed { input: String },

    #[error("Timecode field {field} out of range: {value} (max {max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32
    },

    #[error("Unsupported frame rate: {value}")]
    UnsupportedFrameRate { value: String },

    #[error("Frame rate can only change while the timecode is being edited")]
    FrameRateLocked,

    #[error("Timecode fields can only be set while editing")]
    NotEditing
}

/// Outcome of a blocked or failed session-controller action.
///
/// `UpgradeRequired` is deliberately separate from `Validation` so callers can
/// route the user to the pricing flow instead of showing an input error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Upgrade required: {resource} limit of {limit} reached")]
    UpgradeRequired { resource: String, limit: usize },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Timecode error: {0}")]
    Timecode(#[from] TimecodeError)
}

impl SessionError {
    pub fn is_upgrade_required(&self) -> bool {
        matches!(self, Self::UpgradeRequired { .. })
    }
}
