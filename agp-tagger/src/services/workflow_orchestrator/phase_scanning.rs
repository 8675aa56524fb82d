//! Phase: SCANNING
//!
//! Folder traversal and tag reading through the library boundary.
//! Occupies 0-50% of the scan pass progress bar.

use agp_common::PassKind;
use std::path::Path;
use uuid::Uuid;

use super::{WorkflowError, WorkflowOrchestrator, RESOLUTION_BASELINE};
use crate::models::EnhancedAudioFile;

impl WorkflowOrchestrator {
    /// Scan `root` into a fresh, unannotated inventory
    pub(super) async fn phase_scanning(
        &self,
        pass_id: Uuid,
        root: &Path,
    ) -> Result<Vec<EnhancedAudioFile>, WorkflowError> {
        self.reporter
            .begin_pass(
                pass_id,
                PassKind::Scanning,
                0.0,
                &format!("Scanning {}", root.display()),
            )
            .await;

        tracing::info!(pass_id = %pass_id, root = %root.display(), "Phase: SCANNING");

        let files = self
            .library
            .scan_folder(root)
            .await
            .map_err(WorkflowError::Scan)?;

        let status = format!("Found {} audio files", files.len());
        self.reporter.advance(RESOLUTION_BASELINE, &status).await;

        tracing::info!(pass_id = %pass_id, total_files = files.len(), "Scan complete");

        Ok(files.into_iter().map(EnhancedAudioFile::from).collect())
    }
}
