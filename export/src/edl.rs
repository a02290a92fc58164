use std::fmt::Write;

use crate::ExportInput;
use crate::frames::exclusive_out;

/// CMX3600 EDL with one auxiliary-source event per note.
///
/// Source and record times are the note's in/out points. Instant notes get
/// a one-frame event.
pub(crate) fn render(input: &ExportInput<'_>) -> String {
    let mut out = String::new();
    let title = input.title.replace(['\n', '\r'], " ");
    let _ = writeln!(out, "TITLE: {title}");
    let fcm = if input.fps.is_drop_frame() {
        "DROP FRAME"
    } else {
        "NON-DROP FRAME"
    };
    let _ = writeln!(out, "FCM: {fcm}");

    for (index, note) in input.notes.iter().enumerate() {
        let tc_in = &note.timecode_in;
        let tc_out = exclusive_out(&note.timecode_in, &note.timecode_out, input.fps);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:03}  AX       V     C        {tc_in} {tc_out} {tc_in} {tc_out}",
            index + 1
        );
        for (i, line) in note.text.lines().enumerate() {
            let tag = if i == 0 { "FROM CLIP NAME" } else { "COMMENT" };
            let _ = writeln!(out, "* {tag}: {}", line.trim_end());
        }
    }

    out
}
