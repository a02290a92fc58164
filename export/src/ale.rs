use std::fmt::Write;

use crate::ExportInput;
use crate::frames::exclusive_out;

fn cell(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Avid Log Exchange: tab-delimited heading, column and data sections.
///
/// Filled metadata fields are written into the heading. Each note becomes a
/// row named after the session with its text in `Comments`.
pub(crate) fn render(input: &ExportInput<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Heading");
    let _ = writeln!(out, "FIELD_DELIM\tTABS");
    let _ = writeln!(out, "VIDEO_FORMAT\t1080");
    let _ = writeln!(out, "FPS\t{}", input.fps);
    for field in input.filled_metadata() {
        let _ = writeln!(out, "{}\t{}", cell(&field.label), cell(&field.value));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Column");
    let _ = writeln!(out, "Name\tStart\tEnd\tComments");
    let _ = writeln!(out);
    let _ = writeln!(out, "Data");

    let name = cell(input.title);
    for (index, note) in input.notes.iter().enumerate() {
        let end = exclusive_out(&note.timecode_in, &note.timecode_out, input.fps);
        let _ = writeln!(
            out,
            "{name}_{:03}\t{}\t{end}\t{}",
            index + 1,
            note.timecode_in,
            cell(&note.text)
        );
    }

    out
}
