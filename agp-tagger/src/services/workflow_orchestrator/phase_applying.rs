//! Phase: APPLYING
//!
//! Per-file mutation sequence: write tags (with optional backup), then
//! optional rename, then optional folder organization. Only the tag write
//! decides success; rename and organize failures are logged and leave the
//! earlier steps in effect.

use agp_common::PassKind;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::WorkflowOrchestrator;
use crate::models::{
    non_blank, ApplyOutcome, ApplyReport, AppSettings, EnhancedAudioFile, FileApplyOutcome,
    FileApplyState, Metadata, StepOutcome,
};
use crate::services::progress_reporter::pass_progress;

/// Metadata to write for `entry`, or `None` if there is nothing to apply
///
/// The user's genre override wins, then the accepted suggestion's genre.
/// The accepted suggestion's artist replaces the current one when present.
/// Title, album, year and bpm carry over from the current tags.
pub fn effective_metadata(entry: &EnhancedAudioFile) -> Option<Metadata> {
    let override_genre = non_blank(entry.selected_genre.as_deref()).map(str::to_string);
    let accepted = entry.accepted_suggestion().filter(|s| s.has_payload());

    if override_genre.is_none() && accepted.is_none() {
        return None;
    }

    let mut metadata = entry.file.current_metadata.clone().unwrap_or_default();
    if let Some(suggestion) = accepted {
        if let Some(genre) = &suggestion.genre {
            metadata.genre = Some(genre.clone());
        }
        if let Some(artist) = &suggestion.artist {
            metadata.artist = Some(artist.clone());
        }
    }
    if let Some(genre) = override_genre {
        metadata.genre = Some(genre);
    }

    Some(metadata)
}

impl WorkflowOrchestrator {
    /// Apply accepted suggestions to `files` in inventory order
    ///
    /// Returns the mutated inventory (same order, same length) and the
    /// aggregated report.
    pub async fn execute_apply(
        &self,
        pass_id: Uuid,
        files: Vec<EnhancedAudioFile>,
        settings: &AppSettings,
        base_folder: Option<&Path>,
        cancel_token: &CancellationToken,
    ) -> ApplyOutcome {
        let total = files.len();

        self.reporter
            .begin_pass(pass_id, PassKind::Applying, 0.0, "Applying changes...")
            .await;

        tracing::info!(
            pass_id = %pass_id,
            total_files = total,
            backup = settings.backup_before_changes,
            rename = settings.rename_files,
            organize = settings.organize_files,
            "Phase: APPLYING"
        );

        let mut report = ApplyReport::default();
        let mut applied_files = Vec::with_capacity(total);

        let mut remaining = files.into_iter().enumerate();
        for (index, mut entry) in remaining.by_ref() {
            if cancel_token.is_cancelled() {
                tracing::info!(
                    pass_id = %pass_id,
                    processed = index,
                    total_files = total,
                    "Apply cancelled"
                );
                report.cancelled = true;
                applied_files.push(entry);
                break;
            }

            self.reporter
                .set_status(&format!(
                    "Applying changes to {} ({}/{})",
                    entry.file.filename,
                    index + 1,
                    total
                ))
                .await;

            let original_path = entry.file.path.clone();
            let state = self
                .apply_file(pass_id, &mut entry, settings, base_folder, &mut report)
                .await;
            report.outcomes.push(FileApplyOutcome {
                path: original_path,
                state,
            });

            applied_files.push(entry);
            self.reporter
                .advance(pass_progress(0.0, 100.0, index + 1, total), &report.message())
                .await;
        }

        applied_files.extend(remaining.map(|(_, entry)| entry));

        if total == 0 {
            self.reporter
                .advance(pass_progress(0.0, 100.0, 0, 0), &report.message())
                .await;
        }

        ApplyOutcome {
            files: applied_files,
            report,
        }
    }

    async fn apply_file(
        &self,
        pass_id: Uuid,
        entry: &mut EnhancedAudioFile,
        settings: &AppSettings,
        base_folder: Option<&Path>,
        report: &mut ApplyReport,
    ) -> FileApplyState {
        let Some(metadata) = effective_metadata(entry) else {
            tracing::debug!(
                pass_id = %pass_id,
                file = %entry.file.path.display(),
                "No usable suggestion, skipping"
            );
            return FileApplyState::Skipped;
        };

        if let Err(e) = self
            .library
            .update_metadata(&entry.file.path, &metadata, settings.backup_before_changes)
            .await
        {
            tracing::warn!(
                pass_id = %pass_id,
                file = %entry.file.path.display(),
                error = %e,
                "Tag write failed"
            );
            report.failure_count += 1;
            report.errors.push(format!("{}: {}", entry.file.filename, e));
            return FileApplyState::WriteFailed {
                message: e.to_string(),
            };
        }

        entry.file.current_metadata = Some(metadata.clone());
        report.success_count += 1;

        let rename = if settings.rename_files {
            match self.library.rename_file(&entry.file.path, &metadata).await {
                Ok(new_path) if new_path == entry.file.path => StepOutcome::Unchanged,
                Ok(new_path) => {
                    relocate(entry, &new_path);
                    StepOutcome::Applied(new_path)
                }
                Err(e) => {
                    tracing::warn!(
                        pass_id = %pass_id,
                        file = %entry.file.path.display(),
                        error = %e,
                        "Rename failed"
                    );
                    StepOutcome::Failed(e.to_string())
                }
            }
        } else {
            StepOutcome::NotRequested
        };

        let organize = match (settings.organize_files, base_folder) {
            (true, Some(base)) => {
                match self
                    .library
                    .organize_file(&entry.file.path, &metadata, base, &settings.folder_pattern)
                    .await
                {
                    Ok(new_path) if new_path == entry.file.path => StepOutcome::Unchanged,
                    Ok(new_path) => {
                        relocate(entry, &new_path);
                        report.organized_count += 1;
                        StepOutcome::Applied(new_path)
                    }
                    Err(e) => {
                        tracing::warn!(
                            pass_id = %pass_id,
                            file = %entry.file.path.display(),
                            error = %e,
                            "Organize failed"
                        );
                        StepOutcome::Failed(e.to_string())
                    }
                }
            }
            _ => StepOutcome::NotRequested,
        };

        FileApplyState::Done { rename, organize }
    }
}

fn relocate(entry: &mut EnhancedAudioFile, new_path: &Path) {
    entry.file.path = new_path.to_path_buf();
    if let Some(name) = new_path.file_name() {
        entry.file.filename = name.to_string_lossy().to_string();
    }
}
