//! # TakeNote Core
//!
//! Shared types and traits for the TakeNote session engine.
//!
//! This crate provides:
//! - The session record and everything it owns (notes, mic channels,
//!   metadata fields)
//! - The enumerated frame rates and entitlement tiers
//! - Collaborator traits for the remote store, the local cache, the
//!   entitlement provider and the wall clock
//! - Time-based id generation

pub mod ids;
pub mod traits;
pub mod types;

pub use ids::IdGenerator;
pub use traits::{Clock, EntitlementProvider, LocalCache, RemoteSessionStore, SystemClock};
pub use types::{
    Connectivity, FrameRate, MetadataField, MicAssignment, MicChannel, Note, NoteKind, Session,
    Tier, UserId, Visibility
};
