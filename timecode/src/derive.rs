use chrono::{DateTime, LocalResult, TimeZone, Timelike, Utc};
use tn_core::FrameRate;

use crate::format::{Timecode, frame_at_millis, frame_offset_millis};

fn instant(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
}

/// Timecode displayed at `wall_clock_millis` for a clock running `offset_millis`
/// ahead of the wall clock.
///
/// Pure in its inputs: hours, minutes and seconds come from the calendar
/// fields of `zone` (wrapping at midnight), frames from the millisecond
/// within the second.
pub fn derive_timecode<Tz: TimeZone>(
    wall_clock_millis: i64,
    offset_millis: i64,
    fps: FrameRate,
    zone: &Tz
) -> Timecode {
    let tc_millis = wall_clock_millis.saturating_add(offset_millis);
    let calendar = instant(tc_millis).with_timezone(zone);

    Timecode {
        hours: calendar.hour(),
        minutes: calendar.minute(),
        seconds: calendar.second(),
        frames: frame_at_millis(tc_millis.rem_euclid(1000), fps)
    }
}

/// Offset that makes [`derive_timecode`] show `target` at `now_millis`.
///
/// The target is placed on the current calendar day of `zone`. Local times
/// that fall into a DST gap are read as UTC wall time.
pub fn offset_for<Tz: TimeZone>(
    target: Timecode,
    now_millis: i64,
    fps: FrameRate,
    zone: &Tz
) -> i64 {
    let today = instant(now_millis).with_timezone(zone).date_naive();
    let Some(naive) = today.and_hms_opt(target.hours, target.minutes, target.seconds) else {
        return 0;
    };

    let start_of_second = match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.timestamp_millis(),
        LocalResult::None => naive.and_utc().timestamp_millis()
    };

    start_of_second + frame_offset_millis(target.frames, fps) - now_millis
}
