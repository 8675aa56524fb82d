//! Progress snapshot shared with the presentation layer

use agp_common::PassKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current pass, progress value and status line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Identifier of the pass that last updated the snapshot
    pub pass_id: Option<Uuid>,
    pub pass: PassKind,
    /// 0.0 - 100.0
    pub progress: f64,
    pub status: String,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            pass_id: None,
            pass: PassKind::Idle,
            progress: 0.0,
            status: String::from("Idle"),
        }
    }
}
