//! # Storage Layer
//!
//! Session record stores (in-memory, JSON files on disk) and the local
//! string caches used for best-effort client state.

pub mod cache;
pub mod file;
pub mod memory;

pub use cache::{FileCache, MemoryCache};
pub use file::FileSessionStore;
pub use memory::InMemorySessionStore;

use std::cmp::Ordering;

use tn_core::Session;

/// Ordering for `list`: newest `created_at` first, id as tiebreak.
pub(crate) fn newest_first(a: &Session, b: &Session) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}
