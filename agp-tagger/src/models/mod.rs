//! Data models for agp-tagger
//!
//! - Inventory records and provider suggestions
//! - Runtime settings
//! - Progress snapshot and pass reports

pub mod audio_file;
pub mod pass_report;
pub mod progress;
pub mod settings;

pub use audio_file::{non_blank, AudioFile, Confidence, EnhancedAudioFile, Metadata, MetadataResult};
pub use pass_report::{
    ApplyOutcome, ApplyReport, FileApplyOutcome, FileApplyState, ResolutionOutcome, StepOutcome,
};
pub use progress::ProgressSnapshot;
pub use settings::{AppSettings, DEFAULT_FOLDER_PATTERN};
