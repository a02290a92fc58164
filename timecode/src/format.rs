use errors::TimecodeError;
use serde::{Deserialize, Serialize};
use tn_core::FrameRate;

/// Frame-quantized clock fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32
}

/// `HH:MM:SS:FF`, with `;` before the frames for drop-frame rates.
pub fn format_timecode(hours: u32, minutes: u32, seconds: u32, frames: u32, fps: FrameRate) -> String {
    let sep = if fps.is_drop_frame() { ';' } else { ':' };
    format!("{hours:02}:{minutes:02}:{seconds:02}{sep}{frames:02}")
}

fn check(field: &'static str, value: u32, max: u32) -> Result<(), TimecodeError> {
    if value > max {
        Err(TimecodeError::OutOfRange { field, value, max })
    } else {
        Ok(())
    }
}

impl Timecode {
    /// Builds a timecode whose fields are valid at `fps`.
    pub fn new(
        hours: u32,
        minutes: u32,
        seconds: u32,
        frames: u32,
        fps: FrameRate
    ) -> Result<Self, TimecodeError> {
        check("hours", hours, 23)?;
        check("minutes", minutes, 59)?;
        check("seconds", seconds, 59)?;
        check("frames", frames, fps.max_frame())?;
        Ok(Self {
            hours,
            minutes,
            seconds,
            frames
        })
    }

    pub fn format(&self, fps: FrameRate) -> String {
        format_timecode(self.hours, self.minutes, self.seconds, self.frames, fps)
    }

    /// Parses `HH:MM:SS:FF` or `HH:MM:SS;FF` and validates against `fps`.
    pub fn parse(input: &str, fps: FrameRate) -> Result<Self, TimecodeError> {
        let malformed = || TimecodeError::Malformed {
            input: input.to_string()
        };

        let trimmed = input.trim();
        let parts: Vec<&str> = trimmed.split([':', ';']).collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty() || p.len() > 2) {
            return Err(malformed());
        }

        let mut fields = [0u32; 4];
        for (slot, part) in fields.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| malformed())?;
        }

        Self::new(fields[0], fields[1], fields[2], fields[3], fps)
    }

    /// Pulls the frame field down to the highest frame `fps` can display.
    pub fn clamp_frames(self, fps: FrameRate) -> Self {
        Self {
            frames: self.frames.min(fps.max_frame()),
            ..self
        }
    }

    /// Milliseconds since midnight of the frame's first instant.
    pub fn millis_of_day(&self, fps: FrameRate) -> i64 {
        let whole = i64::from(self.hours * 3600 + self.minutes * 60 + self.seconds) * 1000;
        whole + frame_offset_millis(self.frames, fps)
    }
}

/// Smallest whole millisecond at which `frame` is displayed.
pub(crate) fn frame_offset_millis(frame: u32, fps: FrameRate) -> i64 {
    (f64::from(frame) * fps.frame_duration_ms()).ceil() as i64
}

/// Frame displayed `millis` into a second, `floor(millis * fps / 1000)`
/// clamped to `[0, max_frame]`.
pub(crate) fn frame_at_millis(millis: i64, fps: FrameRate) -> u32 {
    let raw = (millis as f64 * fps.as_f64() / 1000.0).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as u32).min(fps.max_frame())
    }
}
