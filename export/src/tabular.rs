use crate::ExportInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delimiter {
    Comma,
    Tab
}

impl Delimiter {
    fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Tab => '\t'
        }
    }

    fn cell(self, value: &str) -> String {
        match self {
            Self::Comma => {
                if value.contains([',', '"', '\n', '\r']) {
                    format!("\"{}\"", value.replace('"', "\"\""))
                } else {
                    value.to_string()
                }
            }
            Self::Tab => value
                .chars()
                .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
                .collect()
        }
    }
}

/// One row per note. Filled metadata fields become trailing columns with
/// the same value on every row.
pub(crate) fn render(input: &ExportInput<'_>, delimiter: Delimiter) -> String {
    let sep = delimiter.as_char().to_string();
    let metadata: Vec<_> = input.filled_metadata().collect();

    let mut header = vec![
        "Timecode In".to_string(),
        "Timecode Out".to_string(),
        "Type".to_string(),
        "Note".to_string(),
    ];
    header.extend(metadata.iter().map(|f| delimiter.cell(&f.label)));

    let mut out = header.join(&sep);
    out.push('\n');

    for note in &input.notes {
        let mut row = vec![
            delimiter.cell(&note.timecode_in),
            delimiter.cell(&note.timecode_out),
            note.kind.to_string(),
            delimiter.cell(&note.text),
        ];
        row.extend(metadata.iter().map(|f| delimiter.cell(&f.value)));
        out.push_str(&row.join(&sep));
        out.push('\n');
    }

    out
}
