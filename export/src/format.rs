use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    Csv,
    Tsv,
    Edl,
    Fcpxml,
    Ale
}

impl ExportFormat {
    /// CSV is available on every tier; the editing-system formats are Pro.
    pub fn requires_pro(self) -> bool {
        !matches!(self, Self::Csv)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Edl => "edl",
            Self::Fcpxml => "fcpxml",
            Self::Ale => "ale"
        }
    }
}
