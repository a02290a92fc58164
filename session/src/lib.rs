//! # Session
//!
//! The event-driven owner of the current session. User actions, tier gates,
//! the note/mic/metadata lifecycle, debounced persistence and the
//! connectivity and visibility events all go through [`SessionController`].

pub mod controller;
pub mod settings;
pub mod tier;

pub use controller::SessionController;
pub use settings::ControllerSettings;
pub use tier::{can_create_note, can_create_session, can_export};

pub type Result<T> = std::result::Result<T, errors::SessionError>;
