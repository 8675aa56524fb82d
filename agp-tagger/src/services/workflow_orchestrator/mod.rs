//! Library workflow orchestrator
//!
//! Drives the two passes over the inventory:
//!
//! - **Scan + resolve**: SCANNING (0-50%) → RESOLVING (50-100%)
//! - **Apply**: APPLYING (0-100%)
//!
//! Each phase lives in its own `phase_*` module. Passes consume the
//! inventory by value and fold per-file results into a new one; files are
//! handled strictly one at a time in inventory order. The pass's
//! cancellation token is checked before each file; a file already started
//! always runs to completion.

use agp_common::{AgpEvent, EventBus, PassKind};
use chrono::Utc;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{ApplyOutcome, AppSettings, ResolutionOutcome};
use crate::services::audio_library::{AudioLibrary, LibraryError};
use crate::services::library_session::PassGuard;
use crate::services::metadata_aggregator::MetadataLookup;
use crate::services::progress_reporter::ProgressReporter;

mod phase_applying;
mod phase_resolving;
mod phase_scanning;

pub use phase_applying::effective_metadata;

/// Resolution occupies the second half of the scan progress bar
pub const RESOLUTION_BASELINE: f64 = 50.0;
pub const RESOLUTION_SPAN: f64 = 50.0;

/// Pass-aborting errors; per-file failures never surface here
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Scan failed: {0}")]
    Scan(#[source] LibraryError),
}

pub struct WorkflowOrchestrator {
    library: Arc<dyn AudioLibrary>,
    lookup: Arc<dyn MetadataLookup>,
    reporter: ProgressReporter,
    event_bus: EventBus,
}

impl WorkflowOrchestrator {
    pub fn new(
        library: Arc<dyn AudioLibrary>,
        lookup: Arc<dyn MetadataLookup>,
        reporter: ProgressReporter,
        event_bus: EventBus,
    ) -> Self {
        Self {
            library,
            lookup,
            reporter,
            event_bus,
        }
    }

    /// Scan `root`, install the inventory in the session, then resolve it
    ///
    /// A scan failure aborts the pass and leaves the previous inventory in
    /// place. The resolved (or partially resolved, if cancelled) inventory
    /// is swapped into the session before returning.
    pub async fn run_scan_pass(
        &self,
        mut guard: PassGuard,
        root: PathBuf,
    ) -> Result<ResolutionOutcome, WorkflowError> {
        let pass_id = guard.pass_id();

        tracing::info!(pass_id = %pass_id, root = %root.display(), "Starting scan pass");
        self.event_bus.emit_lossy(AgpEvent::PassStarted {
            pass_id,
            pass: PassKind::Scanning,
            timestamp: Utc::now(),
        });

        let files = match self.phase_scanning(pass_id, &root).await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(pass_id = %pass_id, root = %root.display(), error = %e, "Scan pass failed");
                self.event_bus.emit_lossy(AgpEvent::PassFailed {
                    pass_id,
                    pass: PassKind::Scanning,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                self.reporter.finish(&e.to_string()).await;
                return Err(e);
            }
        };

        let session = Arc::clone(guard.session());
        session.reset(root, files.clone()).await;

        guard.set_kind(PassKind::Resolving);
        let outcome = self
            .execute_resolution(pass_id, files, guard.token())
            .await;

        session.replace_inventory(outcome.files.clone()).await;

        self.event_bus.emit_lossy(AgpEvent::ResolutionCompleted {
            pass_id,
            total_files: outcome.files.len(),
            resolved: outcome.resolved,
            skipped: outcome.skipped,
            failed: outcome.failed,
            cancelled: outcome.cancelled,
            status: outcome.status.clone(),
            timestamp: Utc::now(),
        });
        self.reporter.finish(&outcome.status).await;

        tracing::info!(
            pass_id = %pass_id,
            total_files = outcome.files.len(),
            resolved = outcome.resolved,
            skipped = outcome.skipped,
            failed = outcome.failed,
            cancelled = outcome.cancelled,
            "Scan pass completed"
        );

        Ok(outcome)
    }

    /// Apply accepted suggestions to the session inventory
    pub async fn run_apply_pass(&self, guard: PassGuard, settings: &AppSettings) -> ApplyOutcome {
        let pass_id = guard.pass_id();
        let session = Arc::clone(guard.session());

        tracing::info!(pass_id = %pass_id, "Starting apply pass");
        self.event_bus.emit_lossy(AgpEvent::PassStarted {
            pass_id,
            pass: PassKind::Applying,
            timestamp: Utc::now(),
        });

        let files = session.inventory().await;
        let base_folder = session.base_folder().await;

        let outcome = self
            .execute_apply(pass_id, files, settings, base_folder.as_deref(), guard.token())
            .await;

        session.replace_inventory(outcome.files.clone()).await;
        session.set_last_apply_report(outcome.report.clone()).await;

        let message = outcome.report.message();
        self.event_bus.emit_lossy(AgpEvent::ApplyCompleted {
            pass_id,
            success_count: outcome.report.success_count,
            organized_count: outcome.report.organized_count,
            failure_count: outcome.report.failure_count,
            errors: outcome.report.errors.clone(),
            cancelled: outcome.report.cancelled,
            message: message.clone(),
            timestamp: Utc::now(),
        });
        self.reporter.finish(&message).await;

        tracing::info!(pass_id = %pass_id, summary = %message, "Apply pass completed");

        outcome
    }

    /// Run a scan pass in the background
    ///
    /// A panic inside the pass still returns the reporter to idle and emits
    /// [`AgpEvent::PassFailed`]; the guard is released as the task unwinds.
    pub fn spawn_scan_pass(self, guard: PassGuard, root: PathBuf) -> JoinHandle<()> {
        let pass_id = guard.pass_id();
        let reporter = self.reporter.clone();
        let event_bus = self.event_bus.clone();
        spawn_supervised(pass_id, PassKind::Scanning, reporter, event_bus, async move {
            tracing::info!(pass_id = %pass_id, "Background scan task started");
            match self.run_scan_pass(guard, root).await {
                Ok(outcome) => tracing::info!(
                    pass_id = %pass_id,
                    status = %outcome.status,
                    "Background scan task completed"
                ),
                Err(e) => tracing::error!(
                    pass_id = %pass_id,
                    error = %e,
                    "Background scan task failed"
                ),
            }
        })
    }

    /// Run an apply pass in the background, supervised like [`Self::spawn_scan_pass`]
    pub fn spawn_apply_pass(self, guard: PassGuard, settings: AppSettings) -> JoinHandle<()> {
        let pass_id = guard.pass_id();
        let reporter = self.reporter.clone();
        let event_bus = self.event_bus.clone();
        spawn_supervised(pass_id, PassKind::Applying, reporter, event_bus, async move {
            tracing::info!(pass_id = %pass_id, "Background apply task started");
            let outcome = self.run_apply_pass(guard, &settings).await;
            tracing::info!(
                pass_id = %pass_id,
                summary = %outcome.report.message(),
                "Background apply task completed"
            );
        })
    }
}

fn spawn_supervised<F>(
    pass_id: Uuid,
    pass: PassKind,
    reporter: ProgressReporter,
    event_bus: EventBus,
    pass_task: F,
) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let Err(e) = tokio::spawn(pass_task).await else {
            return;
        };
        let error = if e.is_panic() {
            "Pass aborted unexpectedly".to_string()
        } else {
            e.to_string()
        };
        tracing::error!(pass_id = %pass_id, pass = ?pass, error = %e, "Pass task aborted");
        event_bus.emit_lossy(AgpEvent::PassFailed {
            pass_id,
            pass,
            error: error.clone(),
            timestamp: Utc::now(),
        });
        reporter.finish(&error).await;
    })
}
