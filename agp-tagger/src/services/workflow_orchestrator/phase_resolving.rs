//! Phase: RESOLVING
//!
//! Per-file provider lookup and ranking. Occupies 50-100% of the scan pass
//! progress bar.

use agp_common::PassKind;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{WorkflowOrchestrator, RESOLUTION_BASELINE, RESOLUTION_SPAN};
use crate::models::{non_blank, EnhancedAudioFile, MetadataResult, ResolutionOutcome};
use crate::services::metadata_aggregator::{LookupError, MetadataLookup};
use crate::services::progress_reporter::pass_progress;
use crate::services::suggestion_ranker;

/// What happened to one file during resolution
enum FileResolution {
    Resolved(Vec<MetadataResult>),
    Skipped,
    Failed(String),
}

impl WorkflowOrchestrator {
    /// Annotate `files` with ranked suggestions
    ///
    /// Files lacking artist or title are left unannotated. A failing lookup
    /// leaves its file unannotated and the pass moves on. Progress advances
    /// after every file, processed or skipped.
    pub async fn execute_resolution(
        &self,
        pass_id: Uuid,
        files: Vec<EnhancedAudioFile>,
        cancel_token: &CancellationToken,
    ) -> ResolutionOutcome {
        let total = files.len();
        let status = format!("Found {} audio files", total);

        self.reporter
            .begin_pass(pass_id, PassKind::Resolving, RESOLUTION_BASELINE, &status)
            .await;

        tracing::info!(pass_id = %pass_id, total_files = total, "Phase: RESOLVING");

        let mut resolved_files = Vec::with_capacity(total);
        let (mut resolved, mut skipped, mut failed) = (0, 0, 0);
        let mut cancelled = false;

        let mut remaining = files.into_iter().enumerate();
        for (index, mut entry) in remaining.by_ref() {
            if cancel_token.is_cancelled() {
                tracing::info!(
                    pass_id = %pass_id,
                    processed = index,
                    total_files = total,
                    "Resolution cancelled"
                );
                cancelled = true;
                resolved_files.push(entry);
                break;
            }

            self.reporter
                .set_status(&format!(
                    "Fetching metadata for {} ({}/{})",
                    entry.file.filename,
                    index + 1,
                    total
                ))
                .await;

            match self.resolve_file(&entry).await {
                FileResolution::Resolved(suggestions) => {
                    tracing::debug!(
                        pass_id = %pass_id,
                        file = %entry.file.path.display(),
                        suggestions = suggestions.len(),
                        "File resolved"
                    );
                    entry.suggested_metadata = Some(suggestions);
                    resolved += 1;
                }
                FileResolution::Skipped => {
                    tracing::debug!(
                        pass_id = %pass_id,
                        file = %entry.file.path.display(),
                        "Skipping file without artist/title"
                    );
                    skipped += 1;
                }
                FileResolution::Failed(error) => {
                    tracing::warn!(
                        pass_id = %pass_id,
                        file = %entry.file.path.display(),
                        error = %error,
                        "Metadata resolution failed"
                    );
                    failed += 1;
                }
            }

            resolved_files.push(entry);
            self.reporter
                .advance(
                    pass_progress(RESOLUTION_BASELINE, RESOLUTION_SPAN, index + 1, total),
                    &status,
                )
                .await;
        }

        // Files not reached after cancellation keep their previous state
        resolved_files.extend(remaining.map(|(_, entry)| entry));

        if total == 0 {
            self.reporter
                .advance(pass_progress(RESOLUTION_BASELINE, RESOLUTION_SPAN, 0, 0), &status)
                .await;
        }

        let status = if cancelled {
            format!("{} (cancelled)", status)
        } else {
            status
        };

        ResolutionOutcome {
            files: resolved_files,
            status,
            resolved,
            skipped,
            failed,
            cancelled,
        }
    }

    async fn resolve_file(&self, entry: &EnhancedAudioFile) -> FileResolution {
        let Some(metadata) = entry.file.current_metadata.as_ref() else {
            return FileResolution::Skipped;
        };
        let (Some(artist), Some(title)) = (
            non_blank(metadata.artist.as_deref()),
            non_blank(metadata.title.as_deref()),
        ) else {
            return FileResolution::Skipped;
        };

        // Own task so a panicking lookup only loses this file
        let lookup: Arc<dyn MetadataLookup> = Arc::clone(&self.lookup);
        let (artist, title) = (artist.to_string(), title.to_string());
        let task = tokio::spawn(async move { lookup.fetch_metadata(&artist, &title).await });

        match task.await {
            Ok(Ok(suggestions)) => FileResolution::Resolved(suggestion_ranker::rank(suggestions)),
            Ok(Err(LookupError::IncompleteKey(_))) => FileResolution::Skipped,
            Ok(Err(e)) => FileResolution::Failed(e.to_string()),
            Err(e) => FileResolution::Failed(format!("lookup task failed: {}", e)),
        }
    }
}
