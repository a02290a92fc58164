//! Frame counting on formatted timecode strings.
//!
//! Counts are nominal: `ceil(fps)` frames per second, no drop-frame
//! compensation. That matches how the engine labels frames.

use timecode::{Timecode, format_timecode};
use tn_core::FrameRate;

const SECONDS_PER_DAY: u64 = 86_400;

pub(crate) fn nominal_fps(fps: FrameRate) -> u64 {
    u64::from(fps.max_frame()) + 1
}

/// Frames since midnight, or `None` for a malformed string.
pub(crate) fn to_frames(timecode: &str, fps: FrameRate) -> Option<u64> {
    let tc = Timecode::parse(timecode, fps).ok()?;
    let seconds = u64::from(tc.hours) * 3600 + u64::from(tc.minutes) * 60 + u64::from(tc.seconds);
    Some(seconds * nominal_fps(fps) + u64::from(tc.frames))
}

pub(crate) fn from_frames(frames: u64, fps: FrameRate) -> String {
    let per_second = nominal_fps(fps);
    let frames = frames % (SECONDS_PER_DAY * per_second);
    let seconds = frames / per_second;
    format_timecode(
        (seconds / 3600) as u32,
        ((seconds / 60) % 60) as u32,
        (seconds % 60) as u32,
        (frames % per_second) as u32,
        fps
    )
}

/// Out point for a note: its own out point, pushed one frame past the in
/// point when the two coincide.
pub(crate) fn exclusive_out(timecode_in: &str, timecode_out: &str, fps: FrameRate) -> String {
    match (to_frames(timecode_in, fps), to_frames(timecode_out, fps)) {
        (Some(start), Some(end)) if end > start => from_frames(end, fps),
        (Some(start), _) => from_frames(start + 1, fps),
        _ => timecode_out.to_string()
    }
}
