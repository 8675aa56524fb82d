//! Scan session state: the inventory and the single active pass
//!
//! At most one pass (scan+resolve or apply) runs at a time. Starting a pass
//! hands out a [`PassGuard`] carrying the pass's cancellation token; the
//! slot frees itself when the guard drops, even if the pass task panics.

use agp_common::PassKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{ApplyReport, EnhancedAudioFile, Metadata};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A {0:?} pass is already running")]
    PassInProgress(PassKind),

    #[error("No inventory; scan a folder first")]
    NoInventory,

    #[error("No file at index {0}")]
    FileNotFound(usize),

    #[error("File {0} has no suggestion at index {1}")]
    SuggestionNotFound(usize, usize),
}

#[derive(Debug, Clone)]
struct ActivePass {
    pass_id: Uuid,
    kind: PassKind,
    token: CancellationToken,
}

#[derive(Default)]
pub struct LibrarySession {
    inventory: RwLock<Vec<EnhancedAudioFile>>,
    base_folder: RwLock<Option<PathBuf>>,
    last_apply_report: RwLock<Option<ApplyReport>>,
    active_pass: Mutex<Option<ActivePass>>,
}

impl LibrarySession {
    pub fn new() -> Self {
        Self::default()
    }

    fn active_slot(&self) -> MutexGuard<'_, Option<ActivePass>> {
        // Slot holds plain data; a poisoned lock is still consistent
        self.active_pass.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim the pass slot
    pub fn begin_pass(self: &Arc<Self>, kind: PassKind) -> Result<PassGuard, SessionError> {
        let mut slot = self.active_slot();
        if let Some(active) = slot.as_ref() {
            return Err(SessionError::PassInProgress(active.kind));
        }

        let active = ActivePass {
            pass_id: Uuid::new_v4(),
            kind,
            token: CancellationToken::new(),
        };
        *slot = Some(active.clone());

        tracing::debug!(pass_id = %active.pass_id, pass = ?kind, "Pass slot claimed");

        Ok(PassGuard {
            session: Arc::clone(self),
            pass_id: active.pass_id,
            kind,
            token: active.token,
        })
    }

    /// Signal the active pass to stop before its next file
    ///
    /// Returns false if no pass is running.
    pub fn cancel_active(&self) -> bool {
        match self.active_slot().as_ref() {
            Some(active) => {
                tracing::info!(pass_id = %active.pass_id, pass = ?active.kind, "Cancellation requested");
                active.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Kind and id of the running pass, if any
    pub fn active_pass(&self) -> Option<(Uuid, PassKind)> {
        self.active_slot().as_ref().map(|a| (a.pass_id, a.kind))
    }

    /// Fail with [`SessionError::PassInProgress`] while a pass runs
    pub fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.active_slot().as_ref() {
            Some(active) => Err(SessionError::PassInProgress(active.kind)),
            None => Ok(()),
        }
    }

    pub async fn inventory(&self) -> Vec<EnhancedAudioFile> {
        self.inventory.read().await.clone()
    }

    pub async fn base_folder(&self) -> Option<PathBuf> {
        self.base_folder.read().await.clone()
    }

    /// Start a new scan session rooted at `base_folder`
    ///
    /// The inventory is replaced wholesale, never merged.
    pub async fn reset(&self, base_folder: PathBuf, files: Vec<EnhancedAudioFile>) {
        *self.base_folder.write().await = Some(base_folder);
        *self.inventory.write().await = files;
        *self.last_apply_report.write().await = None;
    }

    pub async fn last_apply_report(&self) -> Option<ApplyReport> {
        self.last_apply_report.read().await.clone()
    }

    pub async fn set_last_apply_report(&self, report: ApplyReport) {
        *self.last_apply_report.write().await = Some(report);
    }

    /// Swap in the inventory produced by a pass
    pub async fn replace_inventory(&self, files: Vec<EnhancedAudioFile>) {
        *self.inventory.write().await = files;
    }

    /// Record restored tags for the inventory entry at `path`
    ///
    /// Returns false if no entry has that path.
    pub async fn refresh_metadata(&self, path: &Path, metadata: Metadata) -> bool {
        let mut inventory = self.inventory.write().await;
        match inventory.iter_mut().find(|entry| entry.file.path == path) {
            Some(entry) => {
                entry.file.current_metadata = Some(metadata);
                true
            }
            None => false,
        }
    }

    /// Promote a suggestion and/or set the genre override for one file
    ///
    /// Rejected while a pass is running.
    pub async fn update_selection(
        &self,
        index: usize,
        suggestion_index: Option<usize>,
        genre: Option<Option<String>>,
    ) -> Result<EnhancedAudioFile, SessionError> {
        self.ensure_idle()?;

        let mut inventory = self.inventory.write().await;
        let entry = inventory
            .get_mut(index)
            .ok_or(SessionError::FileNotFound(index))?;

        if let Some(position) = suggestion_index {
            if !entry.select_suggestion(position) {
                return Err(SessionError::SuggestionNotFound(index, position));
            }
        }
        if let Some(genre) = genre {
            entry.selected_genre = genre.filter(|g| !g.trim().is_empty());
        }

        Ok(entry.clone())
    }
}

/// Exclusive right to run one pass
///
/// Dropping the guard frees the session's pass slot.
pub struct PassGuard {
    session: Arc<LibrarySession>,
    pass_id: Uuid,
    kind: PassKind,
    token: CancellationToken,
}

impl PassGuard {
    pub fn pass_id(&self) -> Uuid {
        self.pass_id
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    /// Move the pass to its next phase (scan → resolve)
    pub fn set_kind(&mut self, kind: PassKind) {
        self.kind = kind;
        if let Some(active) = self.session.active_slot().as_mut() {
            if active.pass_id == self.pass_id {
                active.kind = kind;
            }
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn session(&self) -> &Arc<LibrarySession> {
        &self.session
    }
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        let mut slot = self.session.active_slot();
        if slot.as_ref().is_some_and(|a| a.pass_id == self.pass_id) {
            *slot = None;
        }
    }
}
