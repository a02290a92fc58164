//! Shared test fixtures for the TakeNote workspace.
//!
//! - `ManualClock`: a clock tests move by hand
//! - `FlakyStore`: wraps any session store and can be taken offline
//! - `RecordingCache`: a local cache that counts writes and can refuse them
//! - builders for users, sessions and notes

mod fixtures;

pub use fixtures::*;
