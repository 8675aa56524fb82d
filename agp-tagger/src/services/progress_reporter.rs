//! Process-wide progress and status state
//!
//! Both drivers report through one [`ProgressReporter`]. Within a pass the
//! progress value never decreases and always stays within 0-100; every
//! update is broadcast as [`AgpEvent::ProgressUpdate`].

use agp_common::{AgpEvent, EventBus, PassKind};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::ProgressSnapshot;

#[derive(Clone)]
pub struct ProgressReporter {
    state: Arc<RwLock<ProgressSnapshot>>,
    event_bus: EventBus,
}

impl ProgressReporter {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            state: Arc::new(RwLock::new(ProgressSnapshot::default())),
            event_bus,
        }
    }

    /// Reset progress to the pass baseline
    ///
    /// This is the only operation allowed to move progress backwards.
    pub async fn begin_pass(&self, pass_id: Uuid, pass: PassKind, baseline: f64, status: &str) {
        let snapshot = ProgressSnapshot {
            pass_id: Some(pass_id),
            pass,
            progress: clamp(baseline),
            status: status.to_string(),
        };
        *self.state.write().await = snapshot.clone();
        self.publish(snapshot);
    }

    /// Advance progress; lower values than the current one are ignored
    pub async fn advance(&self, progress: f64, status: &str) {
        let snapshot = {
            let mut state = self.state.write().await;
            state.progress = state.progress.max(clamp(progress));
            state.status = status.to_string();
            state.clone()
        };
        self.publish(snapshot);
    }

    /// Replace the status line without touching progress
    pub async fn set_status(&self, status: &str) {
        let snapshot = {
            let mut state = self.state.write().await;
            state.status = status.to_string();
            state.clone()
        };
        self.publish(snapshot);
    }

    /// Mark the pass finished; progress stays where the pass left it
    pub async fn finish(&self, status: &str) {
        let snapshot = {
            let mut state = self.state.write().await;
            state.pass = PassKind::Idle;
            state.status = status.to_string();
            state.clone()
        };
        self.publish(snapshot);
    }

    pub async fn snapshot(&self) -> ProgressSnapshot {
        self.state.read().await.clone()
    }

    fn publish(&self, snapshot: ProgressSnapshot) {
        let Some(pass_id) = snapshot.pass_id else {
            return;
        };
        self.event_bus.emit_lossy(AgpEvent::ProgressUpdate {
            pass_id,
            pass: snapshot.pass,
            progress: snapshot.progress,
            status: snapshot.status,
            timestamp: chrono::Utc::now(),
        });
    }
}

fn clamp(progress: f64) -> f64 {
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 100.0)
}

/// Progress after `done` of `total` files on a `baseline + span` scale
///
/// An empty pass is complete by definition.
pub fn pass_progress(baseline: f64, span: f64, done: usize, total: usize) -> f64 {
    if total == 0 {
        return baseline + span;
    }
    baseline + (done as f64 / total as f64) * span
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_never_regresses_within_pass() {
        let reporter = ProgressReporter::new(EventBus::new(16));
        reporter
            .begin_pass(Uuid::new_v4(), PassKind::Resolving, 50.0, "start")
            .await;

        reporter.advance(75.0, "three quarters").await;
        reporter.advance(60.0, "stale").await;

        let snapshot = reporter.snapshot().await;
        assert_eq!(snapshot.progress, 75.0);
        assert_eq!(snapshot.status, "stale");
    }

    #[tokio::test]
    async fn test_progress_is_clamped() {
        let reporter = ProgressReporter::new(EventBus::new(16));
        reporter
            .begin_pass(Uuid::new_v4(), PassKind::Applying, -5.0, "start")
            .await;
        assert_eq!(reporter.snapshot().await.progress, 0.0);

        reporter.advance(250.0, "over").await;
        assert_eq!(reporter.snapshot().await.progress, 100.0);
    }

    #[tokio::test]
    async fn test_begin_pass_resets_to_baseline() {
        let reporter = ProgressReporter::new(EventBus::new(16));
        reporter
            .begin_pass(Uuid::new_v4(), PassKind::Resolving, 50.0, "resolve")
            .await;
        reporter.advance(100.0, "done").await;

        reporter
            .begin_pass(Uuid::new_v4(), PassKind::Applying, 0.0, "apply")
            .await;
        let snapshot = reporter.snapshot().await;
        assert_eq!(snapshot.progress, 0.0);
        assert_eq!(snapshot.pass, PassKind::Applying);
    }

    #[tokio::test]
    async fn test_updates_are_broadcast() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let reporter = ProgressReporter::new(bus);

        let pass_id = Uuid::new_v4();
        reporter.begin_pass(pass_id, PassKind::Scanning, 0.0, "Scanning").await;
        reporter.advance(50.0, "Found 3 audio files").await;

        rx.recv().await.unwrap();
        match rx.recv().await.unwrap() {
            AgpEvent::ProgressUpdate {
                pass_id: got,
                progress,
                status,
                ..
            } => {
                assert_eq!(got, pass_id);
                assert_eq!(progress, 50.0);
                assert_eq!(status, "Found 3 audio files");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_pass_progress_scale() {
        assert_eq!(pass_progress(50.0, 50.0, 4, 4), 100.0);
        assert_eq!(pass_progress(50.0, 50.0, 1, 2), 75.0);
        assert_eq!(pass_progress(0.0, 100.0, 1, 4), 25.0);
        assert_eq!(pass_progress(0.0, 100.0, 0, 0), 100.0);
    }
}
