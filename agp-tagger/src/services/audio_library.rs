//! Disk boundary consumed by the workflow orchestrator
//!
//! [`AudioLibrary`] is the seam between the pass drivers and the
//! filesystem; [`DiskLibrary`] is the production implementation. All
//! blocking filesystem and tag work runs on the blocking thread pool.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{AudioFile, Metadata};
use crate::services::file_organizer::{self, OrganizeError};
use crate::services::file_scanner::{FileScanner, ScanError};
use crate::services::tag_store::{self, TagError, WriteMode};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Organize(#[from] OrganizeError),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Filesystem and tag operations used by the passes
#[async_trait]
pub trait AudioLibrary: Send + Sync {
    /// Enumerate audio files under `path`, reading their tags
    async fn scan_folder(&self, path: &Path) -> Result<Vec<AudioFile>, LibraryError>;

    /// Write tags, optionally snapshotting the current ones first
    ///
    /// Fields that are `None` leave the existing tag untouched. On error the
    /// file's tags are unchanged.
    async fn update_metadata(
        &self,
        path: &Path,
        metadata: &Metadata,
        backup: bool,
    ) -> Result<(), LibraryError>;

    /// Rename to `"<Artist> - <Title>.<ext>"`; returns the new path
    async fn rename_file(&self, path: &Path, metadata: &Metadata) -> Result<PathBuf, LibraryError>;

    /// Move under `base_folder` following `pattern`; returns the new path
    async fn organize_file(
        &self,
        path: &Path,
        metadata: &Metadata,
        base_folder: &Path,
        pattern: &str,
    ) -> Result<PathBuf, LibraryError>;

    /// Write a backup snapshot's tags back onto `original_path`
    async fn restore_from_backup(
        &self,
        backup_path: &Path,
        original_path: &Path,
    ) -> Result<Metadata, LibraryError>;
}

/// [`AudioLibrary`] backed by the local filesystem and lofty
#[derive(Debug, Default, Clone)]
pub struct DiskLibrary;

impl DiskLibrary {
    pub fn new() -> Self {
        Self
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, LibraryError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LibraryError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| LibraryError::TaskFailed(e.to_string()))?
}

/// Scan and read tags; unreadable tags leave `current_metadata` empty
fn scan_blocking(root: &Path) -> Result<Vec<AudioFile>, LibraryError> {
    let paths = FileScanner::new().scan(root)?;

    let files = paths
        .into_iter()
        .map(|path| {
            let metadata = match tag_store::read_tags(&path) {
                Ok(metadata) => Some(metadata),
                Err(e) => {
                    tracing::debug!(file = %path.display(), error = %e, "Tags unreadable");
                    None
                }
            };
            AudioFile::new(path, metadata)
        })
        .collect();

    Ok(files)
}

#[async_trait]
impl AudioLibrary for DiskLibrary {
    async fn scan_folder(&self, path: &Path) -> Result<Vec<AudioFile>, LibraryError> {
        let root = path.to_path_buf();
        run_blocking(move || scan_blocking(&root)).await
    }

    async fn update_metadata(
        &self,
        path: &Path,
        metadata: &Metadata,
        backup: bool,
    ) -> Result<(), LibraryError> {
        let path = path.to_path_buf();
        let metadata = metadata.clone();
        run_blocking(move || {
            if backup {
                tag_store::create_backup(&path)?;
            }
            tag_store::write_tags(&path, &metadata, WriteMode::Merge)?;
            Ok(())
        })
        .await
    }

    async fn rename_file(&self, path: &Path, metadata: &Metadata) -> Result<PathBuf, LibraryError> {
        let path = path.to_path_buf();
        let metadata = metadata.clone();
        run_blocking(move || Ok(file_organizer::rename_file(&path, &metadata)?)).await
    }

    async fn organize_file(
        &self,
        path: &Path,
        metadata: &Metadata,
        base_folder: &Path,
        pattern: &str,
    ) -> Result<PathBuf, LibraryError> {
        let path = path.to_path_buf();
        let metadata = metadata.clone();
        let base_folder = base_folder.to_path_buf();
        let pattern = pattern.to_string();
        run_blocking(move || {
            Ok(file_organizer::organize_file(
                &path,
                &metadata,
                &base_folder,
                &pattern,
            )?)
        })
        .await
    }

    async fn restore_from_backup(
        &self,
        backup_path: &Path,
        original_path: &Path,
    ) -> Result<Metadata, LibraryError> {
        let backup_path = backup_path.to_path_buf();
        let original_path = original_path.to_path_buf();
        run_blocking(move || Ok(tag_store::restore_backup(&backup_path, &original_path)?)).await
    }
}
