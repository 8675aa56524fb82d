//! Tag reading, writing and backup snapshots
//!
//! Uses lofty for every supported container. Backups are JSON snapshots of
//! the semantic tag set stored next to the file in a hidden folder:
//! `<dir>/.autogenre_backups/<filename>.<unix-millis>.json`.

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{non_blank, Metadata};

/// Hidden folder holding tag snapshots, one per directory
pub const BACKUP_DIR_NAME: &str = ".autogenre_backups";

#[derive(Debug, Error)]
pub enum TagError {
    #[error("Failed to read tags from {0}: {1}")]
    Read(PathBuf, String),

    #[error("Failed to write tags to {0}: {1}")]
    Write(PathBuf, String),

    #[error("Backup failed for {0}: {1}")]
    Backup(PathBuf, String),

    #[error("Invalid backup {0}: {1}")]
    InvalidBackup(PathBuf, String),
}

/// How absent fields are treated on write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Absent fields leave existing tags alone
    Merge,
    /// Absent fields clear existing tags (restoring a snapshot)
    Replace,
}

/// Snapshot persisted before a tag write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagBackup {
    pub original_path: PathBuf,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub metadata: Metadata,
}

/// Read the semantic tag set
///
/// A readable file without any tag yields an empty [`Metadata`].
pub fn read_tags(path: &Path) -> Result<Metadata, TagError> {
    let tagged_file = Probe::open(path)
        .map_err(|e| TagError::Read(path.to_path_buf(), e.to_string()))?
        .read()
        .map_err(|e| TagError::Read(path.to_path_buf(), e.to_string()))?;

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return Ok(Metadata::default());
    };

    let text = |value: Option<std::borrow::Cow<'_, str>>| {
        value.and_then(|v| non_blank(Some(v.as_ref())).map(str::to_string))
    };

    let bpm = tag
        .get_string(&ItemKey::Bpm)
        .or_else(|| tag.get_string(&ItemKey::IntegerBpm))
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u32);

    Ok(Metadata {
        title: text(tag.title()),
        artist: text(tag.artist()),
        album: text(tag.album()),
        genre: text(tag.genre()),
        year: tag.year().and_then(|y| i32::try_from(y).ok()),
        bpm,
    })
}

/// Write the semantic tag set into the file's primary tag
///
/// Files without a tag get a new one of their primary tag type.
pub fn write_tags(path: &Path, metadata: &Metadata, mode: WriteMode) -> Result<(), TagError> {
    let write_err = |e: lofty::error::LoftyError| TagError::Write(path.to_path_buf(), e.to_string());

    let mut tagged_file = Probe::open(path).map_err(write_err)?.read().map_err(write_err)?;

    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }

    let tag = tagged_file.tag_mut(tag_type).ok_or_else(|| {
        TagError::Write(path.to_path_buf(), format!("{:?} tag unavailable", tag_type))
    })?;

    apply_to_tag(tag, metadata, mode);

    tag.save_to_path(path, WriteOptions::default())
        .map_err(write_err)?;

    tracing::debug!(file = %path.display(), ?mode, "Tags written");
    Ok(())
}

fn apply_to_tag(tag: &mut Tag, metadata: &Metadata, mode: WriteMode) {
    let clear = mode == WriteMode::Replace;

    match &metadata.title {
        Some(title) => tag.set_title(title.clone()),
        None if clear => tag.remove_title(),
        None => {}
    }
    match &metadata.artist {
        Some(artist) => tag.set_artist(artist.clone()),
        None if clear => tag.remove_artist(),
        None => {}
    }
    match &metadata.album {
        Some(album) => tag.set_album(album.clone()),
        None if clear => tag.remove_album(),
        None => {}
    }
    match &metadata.genre {
        Some(genre) => tag.set_genre(genre.clone()),
        None if clear => tag.remove_genre(),
        None => {}
    }
    match metadata.year.and_then(|y| u32::try_from(y).ok()) {
        Some(year) => tag.set_year(year),
        None if clear => tag.remove_year(),
        None => {}
    }
    match metadata.bpm {
        Some(bpm) => {
            tag.insert_text(ItemKey::Bpm, bpm.to_string());
        }
        None if clear => tag.remove_key(&ItemKey::Bpm),
        None => {}
    }
}

/// Backup location for `path` at `timestamp_ms`
pub fn backup_path_for(path: &Path, timestamp_ms: i64) -> PathBuf {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dir.join(BACKUP_DIR_NAME)
        .join(format!("{}.{}.json", file_name, timestamp_ms))
}

/// Snapshot the current tags of `path`
///
/// Fails when the tags cannot be read; the caller must not write then.
pub fn create_backup(path: &Path) -> Result<PathBuf, TagError> {
    let backup_err = |e: String| TagError::Backup(path.to_path_buf(), e);

    let metadata = read_tags(path).map_err(|e| backup_err(e.to_string()))?;
    let created_at = chrono::Utc::now();
    let backup_path = backup_path_for(path, created_at.timestamp_millis());

    let snapshot = TagBackup {
        original_path: path.to_path_buf(),
        created_at,
        metadata,
    };
    let json = serde_json::to_string_pretty(&snapshot).map_err(|e| backup_err(e.to_string()))?;

    if let Some(parent) = backup_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| backup_err(e.to_string()))?;
    }
    std::fs::write(&backup_path, json).map_err(|e| backup_err(e.to_string()))?;

    tracing::debug!(
        file = %path.display(),
        backup = %backup_path.display(),
        "Tag backup created"
    );
    Ok(backup_path)
}

/// Accepted backup file layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum BackupFile {
    Snapshot(TagBackup),
    /// Plain metadata object, as older backups were written
    Bare(Metadata),
}

/// Load the tags held by a backup file
///
/// Reads both the [`TagBackup`] snapshot written by [`create_backup`] and a
/// bare metadata object. A bare object carrying no field is rejected.
pub fn load_backup(backup_path: &Path) -> Result<Metadata, TagError> {
    let invalid = |e: String| TagError::InvalidBackup(backup_path.to_path_buf(), e);
    let content = std::fs::read_to_string(backup_path).map_err(|e| invalid(e.to_string()))?;
    let parsed: BackupFile = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    match parsed {
        BackupFile::Snapshot(snapshot) => Ok(snapshot.metadata),
        BackupFile::Bare(metadata) if metadata == Metadata::default() => {
            Err(invalid("no metadata fields".to_string()))
        }
        BackupFile::Bare(metadata) => Ok(metadata),
    }
}

/// Write a backup's tags back onto `target`
pub fn restore_backup(backup_path: &Path, target: &Path) -> Result<Metadata, TagError> {
    let metadata = load_backup(backup_path)?;
    write_tags(target, &metadata, WriteMode::Replace)?;
    tracing::info!(
        file = %target.display(),
        backup = %backup_path.display(),
        "Tags restored from backup"
    );
    Ok(metadata)
}
