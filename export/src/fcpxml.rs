use std::fmt::Write;

use tn_core::FrameRate;

use crate::ExportInput;
use crate::frames::{nominal_fps, to_frames};

/// Frame duration as a rational `(numerator, denominator)` of seconds.
fn frame_duration(fps: FrameRate) -> (u64, u64) {
    match fps {
        FrameRate::Fps23_976 => (1001, 24000),
        FrameRate::Fps29_97 => (1001, 30000),
        FrameRate::Fps59_94 => (1001, 60000),
        other => (1, nominal_fps(other))
    }
}

fn rational(frames: u64, fps: FrameRate) -> String {
    let (num, den) = frame_duration(fps);
    if frames == 0 {
        "0s".to_string()
    } else {
        format!("{}/{}s", frames * num, den)
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' | '\r' | '\t' => out.push(' '),
            c => out.push(c)
        }
    }
    out
}

/// FCPXML 1.9 project holding one gap clip with a marker per note.
///
/// The gap starts at the first note's in point; marker offsets are relative
/// to that start.
pub(crate) fn render(input: &ExportInput<'_>) -> String {
    let fps = input.fps;
    let marks: Vec<(u64, u64, &str)> = input
        .notes
        .iter()
        .filter_map(|n| {
            let start = to_frames(&n.timecode_in, fps)?;
            let end = to_frames(&n.timecode_out, fps).unwrap_or(start);
            Some((start, end.saturating_sub(start).max(1), n.text.as_str()))
        })
        .collect();

    let origin = marks.iter().map(|m| m.0).min().unwrap_or(0);
    let length = marks
        .iter()
        .map(|(start, dur, _)| start - origin + dur)
        .max()
        .unwrap_or(1);
    let (num, den) = frame_duration(fps);
    let title = escape(input.title);

    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(out, "<!DOCTYPE fcpxml>");
    let _ = writeln!(out, r#"<fcpxml version="1.9">"#);
    let _ = writeln!(out, "  <resources>");
    let _ = writeln!(
        out,
        r#"    <format id="r1" name="FFVideoFormat1080p{}" frameDuration="{num}/{den}s" width="1920" height="1080"/>"#,
        fps.to_string().replace('.', "")
    );
    let _ = writeln!(out, "  </resources>");
    let _ = writeln!(out, "  <library>");
    let _ = writeln!(out, r#"    <event name="{title}">"#);
    let _ = writeln!(out, r#"      <project name="{title}">"#);
    let _ = writeln!(
        out,
        r#"        <sequence format="r1" tcStart="{}" tcFormat="{}" duration="{}">"#,
        rational(origin, fps),
        if fps.is_drop_frame() { "DF" } else { "NDF" },
        rational(length, fps)
    );
    let _ = writeln!(out, "          <spine>");
    let _ = writeln!(
        out,
        r#"            <gap name="TakeNote" offset="{}" start="{}" duration="{}">"#,
        rational(origin, fps),
        rational(origin, fps),
        rational(length, fps)
    );
    for (start, duration, text) in &marks {
        let _ = writeln!(
            out,
            r#"              <marker start="{}" duration="{}" value="{}"/>"#,
            rational(*start, fps),
            rational(*duration, fps),
            escape(text)
        );
    }
    let _ = writeln!(out, "            </gap>");
    let _ = writeln!(out, "          </spine>");
    let _ = writeln!(out, "        </sequence>");
    let _ = writeln!(out, "      </project>");
    let _ = writeln!(out, "    </event>");
    let _ = writeln!(out, "  </library>");
    let _ = writeln!(out, "</fcpxml>");
    out
}
