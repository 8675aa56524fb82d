//! Results of resolution and apply passes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::EnhancedAudioFile;

/// Outcome of an optional step (rename or organize) for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Step disabled in settings (or no base folder for organize)
    NotRequested,
    /// Step succeeded; file now lives at this path
    Applied(PathBuf),
    /// File already sat at the computed target; nothing moved
    Unchanged,
    /// Step failed; earlier steps stay in effect
    Failed(String),
}

/// Terminal state of one file in an apply pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileApplyState {
    /// No usable suggestion; counts as neither success nor failure
    Skipped,
    /// Tag write failed; rename and organize were not attempted
    WriteFailed { message: String },
    /// Tags written; optional steps reported individually
    Done {
        rename: StepOutcome,
        organize: StepOutcome,
    },
}

/// Per-file record of an apply pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileApplyOutcome {
    /// Path of the file when the pass reached it
    pub path: PathBuf,
    pub state: FileApplyState,
}

/// Aggregated apply result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub success_count: usize,
    pub organized_count: usize,
    pub failure_count: usize,
    /// `"<filename>: <message>"` per failed write
    pub errors: Vec<String>,
    pub cancelled: bool,
    pub outcomes: Vec<FileApplyOutcome>,
}

impl ApplyReport {
    /// Human-readable summary line
    pub fn message(&self) -> String {
        let mut message = format!("Successfully updated {} files", self.success_count);
        if self.organized_count > 0 {
            message.push_str(&format!(", organized {} into folders", self.organized_count));
        }
        if self.failure_count > 0 {
            message.push_str(&format!(", {} failed", self.failure_count));
        }
        if self.cancelled {
            message.push_str(" (cancelled)");
        }
        message
    }
}

/// Result of an apply pass: the new inventory plus the report
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub files: Vec<EnhancedAudioFile>,
    pub report: ApplyReport,
}

/// Result of a resolution pass
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub files: Vec<EnhancedAudioFile>,
    /// Status line reporting the total file count
    pub status: String,
    /// Files annotated with suggestions (possibly an empty list)
    pub resolved: usize,
    /// Files lacking artist or title
    pub skipped: usize,
    /// Files whose lookup failed; left unannotated
    pub failed: usize,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_with_only_successes() {
        let report = ApplyReport {
            success_count: 3,
            ..Default::default()
        };
        assert_eq!(report.message(), "Successfully updated 3 files");
    }

    #[test]
    fn test_message_with_organized_and_failures() {
        let report = ApplyReport {
            success_count: 4,
            organized_count: 2,
            failure_count: 1,
            errors: vec!["a.mp3: disk full".to_string()],
            ..Default::default()
        };
        assert_eq!(
            report.message(),
            "Successfully updated 4 files, organized 2 into folders, 1 failed"
        );
    }

    #[test]
    fn test_message_when_cancelled() {
        let report = ApplyReport {
            success_count: 1,
            cancelled: true,
            ..Default::default()
        };
        assert_eq!(report.message(), "Successfully updated 1 files (cancelled)");
    }
}
