//! Row types for every table metatag stores.
//!
//! These are the single source of truth shared by the engine and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Libraries & Files
// ============================================================================

/// A folder registered for scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub id: i64,
    pub path: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Supported media formats, keyed by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Mp3,
    Flac,
    Ogg,
    Wav,
    Pdf,
    Epub,
}

/// Broad grouping used to pick which tag fields matter for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Audio,
    Document,
}

const AUDIO_FIELDS: &[&str] = &[
    "title",
    "artist",
    "album",
    "album_artist",
    "genre",
    "year",
    "track",
    "disc",
    "composer",
    "comment",
];

const DOCUMENT_FIELDS: &[&str] = &[
    "title",
    "author",
    "subject",
    "keywords",
    "publisher",
    "description",
    "language",
    "year",
];

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Wav => "wav",
            Self::Pdf => "pdf",
            Self::Epub => "epub",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            "wav" => Some(Self::Wav),
            "pdf" => Some(Self::Pdf),
            "epub" => Some(Self::Epub),
            _ => None,
        }
    }

    /// Detect the type from the text after the last dot of a filename.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::parse(ext)
    }

    pub fn category(&self) -> FileCategory {
        match self {
            Self::Mp3 | Self::Flac | Self::Ogg | Self::Wav => FileCategory::Audio,
            Self::Pdf | Self::Epub => FileCategory::Document,
        }
    }

    /// Tag keys worth surfacing first for this type.
    pub fn common_fields(&self) -> &'static [&'static str] {
        match self.category() {
            FileCategory::Audio => AUDIO_FIELDS,
            FileCategory::Document => DOCUMENT_FIELDS,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub library_id: i64,
    /// Full path on disk.
    pub path: String,
    /// Display name, extension included.
    pub filename: String,
    pub file_type: FileType,
    pub size: u64,
    /// Last-modified time exactly as recorded by the scanner.
    pub modified_at: String,
    pub scanned_at: DateTime<Utc>,
}

/// Input for [`crate::LibraryDb::upsert_file`].
#[derive(Debug, Clone)]
pub struct NewFile {
    pub library_id: i64,
    pub path: String,
    pub filename: String,
    pub file_type: FileType,
    pub size: u64,
    pub modified_at: String,
}

// ============================================================================
// Tags
// ============================================================================

/// Where a tag value came from. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSource {
    Native,
    Sidecar,
    Rule,
}

impl TagSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Sidecar => "sidecar",
            Self::Rule => "rule",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "native" => Some(Self::Native),
            "sidecar" => Some(Self::Sidecar),
            "rule" => Some(Self::Rule),
            _ => None,
        }
    }
}

/// One key/value pair on a file. Unique per (file_id, key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub file_id: i64,
    pub key: String,
    pub value: String,
    pub source: TagSource,
}

// ============================================================================
// Tag Rules
// ============================================================================

/// The file attribute a rule's regex runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceField {
    /// Display filename, extension included.
    Filename,
    /// Parent directory of the full path.
    Folder,
    /// 1-based position of the file within the evaluated batch.
    Index,
    /// Stored last-modified timestamp.
    Datetime,
    /// Current value of another tag on the same file.
    TagRef(String),
    /// Anything unrecognised. Kept verbatim so rows round-trip; never yields a value.
    Other(String),
}

const TAG_PREFIX: &str = "tag:";

impl SourceField {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "filename" => Self::Filename,
            "folder" => Self::Folder,
            "index" => Self::Index,
            "datetime" => Self::Datetime,
            _ => match raw.strip_prefix(TAG_PREFIX) {
                Some(key) => Self::TagRef(key.to_string()),
                None => Self::Other(raw.to_string()),
            },
        }
    }

    pub fn as_db_string(&self) -> String {
        match self {
            Self::Filename => "filename".to_string(),
            Self::Folder => "folder".to_string(),
            Self::Index => "index".to_string(),
            Self::Datetime => "datetime".to_string(),
            Self::TagRef(key) => format!("{}{}", TAG_PREFIX, key),
            Self::Other(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_db_string())
    }
}

impl std::str::FromStr for SourceField {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for SourceField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_db_string())
    }
}

impl<'de> Deserialize<'de> for SourceField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <String as Deserialize>::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// A named regex rule that derives one tag from a file attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub id: i64,
    pub name: String,
    pub source_field: SourceField,
    pub regex: String,
    pub target_field: String,
    /// Replacement using `$0..$N` capture placeholders.
    pub template: String,
    /// Seeded at first run; the CLI refuses to delete these.
    pub is_preset: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::LibraryDb::create_rule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTagRule {
    pub name: String,
    pub source_field: SourceField,
    pub regex: String,
    pub target_field: String,
    pub template: String,
    #[serde(default)]
    pub is_preset: bool,
}

// ============================================================================
// History
// ============================================================================

/// Kind of mutation recorded in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryOperation {
    Create,
    Update,
    Delete,
}

impl HistoryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HistoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An applied mutation. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagHistoryEntry {
    pub id: i64,
    pub file_id: i64,
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub operation: HistoryOperation,
    pub timestamp: DateTime<Utc>,
}

/// Input for [`crate::LibraryDb::add_history`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub file_id: i64,
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub operation: HistoryOperation,
}
