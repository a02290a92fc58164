//! # Timecode Engine
//!
//! A virtual `HH:MM:SS:FF` clock. The displayed value is always derived from
//! the wall clock plus a persisted offset, never accumulated from timer
//! ticks, so it stays correct across sleep/wake and frame-rate changes.

pub mod derive;
pub mod engine;
pub mod format;

pub use derive::{derive_timecode, offset_for};
pub use engine::{OFFSET_CACHE_KEY, TimecodeEngine};
pub use format::{Timecode, format_timecode};
