//! Process-wide runtime settings

use serde::{Deserialize, Serialize};

/// Default folder pattern used by organize
pub const DEFAULT_FOLDER_PATTERN: &str = "{genre}";

/// Runtime settings persisted by [`crate::config::SettingsStore`]
///
/// Missing keys in the persisted document take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub beatport_username: String,
    pub beatport_password: String,

    /// Organize template; placeholders `{genre}`, `{artist}`, `{title}`,
    /// `{album}`, `{year}`. `/` creates nested folders.
    pub folder_pattern: String,

    /// Snapshot current tags before each write
    pub backup_before_changes: bool,
    /// Move files under the scanned folder using `folder_pattern`
    pub organize_files: bool,
    /// Rename files to "Artist - Title.ext"
    pub rename_files: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            spotify_client_id: String::new(),
            spotify_client_secret: String::new(),
            beatport_username: String::new(),
            beatport_password: String::new(),
            folder_pattern: DEFAULT_FOLDER_PATTERN.to_string(),
            backup_before_changes: true,
            organize_files: false,
            rename_files: false,
        }
    }
}
