use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Frame rates a session can run at.
///
/// Serialized as a plain JSON number (`29.97`) so stored records stay
/// readable by other clients of the same store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumString, Display, EnumIter)]
pub enum FrameRate {
    #[strum(serialize = "23.976")]
    Fps23_976,
    #[strum(serialize = "24")]
    Fps24,
    #[default]
    #[strum(serialize = "25")]
    Fps25,
    #[strum(serialize = "29.97")]
    Fps29_97,
    #[strum(serialize = "30")]
    Fps30,
    #[strum(serialize = "50")]
    Fps50,
    #[strum(serialize = "59.94")]
    Fps59_94,
    #[strum(serialize = "60")]
    Fps60
}

impl FrameRate {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Fps23_976 => 23.976,
            Self::Fps24 => 24.0,
            Self::Fps25 => 25.0,
            Self::Fps29_97 => 29.97,
            Self::Fps30 => 30.0,
            Self::Fps50 => 50.0,
            Self::Fps59_94 => 59.94,
            Self::Fps60 => 60.0
        }
    }

    /// Drop-frame rates use `;` before the frame field.
    pub fn is_drop_frame(self) -> bool {
        matches!(self, Self::Fps29_97 | Self::Fps59_94)
    }

    /// Highest displayable frame number, `ceil(fps) - 1`.
    pub fn max_frame(self) -> u32 {
        self.as_f64().ceil() as u32 - 1
    }

    /// Nominal duration of one frame in milliseconds.
    pub fn frame_duration_ms(self) -> f64 {
        1000.0 / self.as_f64()
    }

    /// Matches a numeric rate against the enumerated set.
    pub fn from_f64(value: f64) -> Option<Self> {
        Self::iter().find(|rate| (rate.as_f64() - value).abs() < 1e-6)
    }
}

impl Serialize for FrameRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for FrameRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported frame rate {value}")))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoteKind {
    /// Typed and committed at the current timecode.
    #[default]
    Quick,
    /// Spans the interval between starting and finishing the edit.
    Long,
    /// Inserted retroactively at an arbitrary timecode.
    Custom
}

/// Network reachability as reported by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Connectivity {
    Online,
    Offline
}

/// Foreground/background state of the owning view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: String) -> Option<Self> {
        if id.trim().is_empty() || id.len() > 128 {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string()).ok_or_else(|| format!("invalid user id: {s:?}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub timecode_in: String,
    pub timecode_out: String,
    pub text: String,
    #[serde(default)]
    pub kind: NoteKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool
}

impl Note {
    /// Instantaneous note: in and out point coincide.
    pub fn instant(
        id: String,
        timecode: String,
        text: String,
        kind: NoteKind,
        timestamp: DateTime<Utc>
    ) -> Self {
        Self {
            id,
            timecode_out: timecode.clone(),
            timecode_in: timecode,
            text,
            kind,
            timestamp,
            deleted: false
        }
    }

    pub fn is_live(&self) -> bool {
        !self.deleted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicAssignment {
    pub person_name: String,
    /// `None` for the initial assignment of a channel.
    #[serde(default)]
    pub timecode: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicChannel {
    pub number: u32,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub assignments: Vec<MicAssignment>
}

impl MicChannel {
    pub fn new(number: u32, frequency: String) -> Self {
        Self {
            number,
            frequency,
            assignments: Vec::new()
        }
    }

    /// The person currently wearing the channel, if any.
    pub fn current_person(&self) -> Option<&str> {
        self.assignments.last().map(|a| a.person_name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataField {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub placeholder: String
}

impl MetadataField {
    pub fn new(id: &str, label: &str, placeholder: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            value: String::new(),
            placeholder: placeholder.to_string()
        }
    }

    /// Fields every new session starts with.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("production", "Production", "e.g., Documentary 2025"),
            Self::new("scene", "Scene", "e.g., INT. OFFICE - DAY"),
            Self::new("take", "Take", "e.g., 3"),
            Self::new("cameraName", "Camera", "e.g., A-Cam"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    /// Absent until the first successful persist.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub mics: Vec<MicChannel>,
    #[serde(default)]
    pub metadata: Vec<MetadataField>,
    #[serde(default)]
    pub fps: FrameRate,
    #[serde(default)]
    pub tc_offset: i64
}

impl Session {
    pub fn new(id: String, name: String, created_at: DateTime<Utc>, fps: FrameRate) -> Self {
        Self {
            id,
            name,
            user_id: None,
            created_at,
            updated_at: None,
            notes: Vec::new(),
            mics: Vec::new(),
            metadata: MetadataField::defaults(),
            fps,
            tc_offset: 0
        }
    }

    /// Notes that have not been tombstoned, in stored order.
    pub fn visible_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|n| n.is_live())
    }

    pub fn live_note_count(&self) -> usize {
        self.visible_notes().count()
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn note_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    pub fn mic_mut(&mut self, number: u32) -> Option<&mut MicChannel> {
        self.mics.iter_mut().find(|m| m.number == number)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut MetadataField> {
        self.metadata.iter_mut().find(|f| f.id == id)
    }

    /// Stable display order: by in-point, then id.
    pub fn sort_notes_by_timecode(&mut self) {
        self.notes.sort_by(|a, b| {
            a.timecode_in
                .cmp(&b.timecode_in)
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}
