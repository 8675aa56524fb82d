//! Inventory records: audio files, tag sets and provider suggestions

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

/// Semantic tag set of one audio file
///
/// Every field is independently optional; `None` means "unknown", never an
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub bpm: Option<u32>,
}

impl Metadata {
    /// Artist and title are both present and non-blank
    pub fn is_identifiable(&self) -> bool {
        non_blank(self.artist.as_deref()).is_some() && non_blank(self.title.as_deref()).is_some()
    }
}

/// Trimmed value if present and not blank
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Identity record for one file found by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Display file name (last path component)
    pub filename: String,
    /// Lowercase extension without the dot
    pub extension: String,
    /// Tags read at scan time; advanced only after a successful write
    pub current_metadata: Option<Metadata>,
}

impl AudioFile {
    pub fn new(path: PathBuf, current_metadata: Option<Metadata>) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            path,
            filename,
            extension,
            current_metadata,
        }
    }
}

/// Reliability label attached by a provider to one suggestion
///
/// Totally ordered: `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    fn rank(self) -> u8 {
        match self {
            Confidence::High => 2,
            Confidence::Medium => 1,
            Confidence::Low => 0,
        }
    }
}

impl Ord for Confidence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Confidence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One suggestion from one provider
///
/// The confidence is assigned by the provider and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataResult {
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub confidence: Confidence,
    /// Provider identifier, e.g. "Spotify" or "MusicBrainz (No match)"
    pub source: String,
}

impl MetadataResult {
    /// Carries a genre or an artist that could be written
    pub fn has_payload(&self) -> bool {
        self.genre.is_some() || self.artist.is_some()
    }
}

/// Inventory entry: an audio file plus its ranked suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedAudioFile {
    #[serde(flatten)]
    pub file: AudioFile,

    /// Ranked suggestions; position 0 is the accepted suggestion.
    /// `None` until a resolution pass annotates the file.
    #[serde(default)]
    pub suggested_metadata: Option<Vec<MetadataResult>>,

    /// Genre chosen by the user, overrides the accepted suggestion's genre
    #[serde(default)]
    pub selected_genre: Option<String>,
}

impl EnhancedAudioFile {
    /// The suggestion applied by default
    pub fn accepted_suggestion(&self) -> Option<&MetadataResult> {
        self.suggested_metadata.as_ref().and_then(|s| s.first())
    }

    /// Promote the suggestion at `index` to position 0
    ///
    /// The remaining entries keep their relative order. Returns false if
    /// the file has no suggestion at that index.
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        match self.suggested_metadata.as_mut() {
            Some(suggestions) if index < suggestions.len() => {
                let chosen = suggestions.remove(index);
                suggestions.insert(0, chosen);
                true
            }
            _ => false,
        }
    }
}

impl From<AudioFile> for EnhancedAudioFile {
    fn from(file: AudioFile) -> Self {
        Self {
            file,
            suggested_metadata: None,
            selected_genre: None,
        }
    }
}
