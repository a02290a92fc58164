//! # Export
//!
//! Pure serializers that turn a session's live notes into the interchange
//! formats editors import: CSV, TSV, CMX3600 EDL, FCPXML markers and Avid
//! ALE. Tombstoned notes are never exported.

mod ale;
mod edl;
mod fcpxml;
mod format;
mod frames;
mod tabular;

pub use format::ExportFormat;

use tn_core::{FrameRate, MetadataField, Note, Session};

/// Everything a serializer reads. Built from a session so that tombstones
/// are filtered in one place.
#[derive(Debug, Clone)]
pub struct ExportInput<'a> {
    pub title: &'a str,
    pub notes: Vec<&'a Note>,
    pub metadata: &'a [MetadataField],
    pub fps: FrameRate
}

impl<'a> ExportInput<'a> {
    pub fn from_session(session: &'a Session) -> Self {
        Self {
            title: &session.name,
            notes: session.visible_notes().collect(),
            metadata: &session.metadata,
            fps: session.fps
        }
    }

    /// Metadata fields that carry a value, in display order.
    fn filled_metadata(&self) -> impl Iterator<Item = &MetadataField> {
        self.metadata.iter().filter(|f| !f.value.trim().is_empty())
    }
}

/// Serializes `input` in `format`. Deterministic for a given input.
pub fn render(format: ExportFormat, input: &ExportInput<'_>) -> String {
    match format {
        ExportFormat::Csv => tabular::render(input, tabular::Delimiter::Comma),
        ExportFormat::Tsv => tabular::render(input, tabular::Delimiter::Tab),
        ExportFormat::Edl => edl::render(input),
        ExportFormat::Fcpxml => fcpxml::render(input),
        ExportFormat::Ale => ale::render(input)
    }
}

/// Suggested file name, `<session name>.<extension>` with path separators
/// replaced.
pub fn file_name(format: ExportFormat, title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}.{}", stem.trim(), format.extension())
}
