//! File renaming and folder organization
//!
//! Renames follow `"<Artist> - <Title>.<ext>"`. Organization moves a file to
//! `<base>/<expanded pattern>/<filename>`, where the pattern placeholders
//! `{genre}`, `{artist}`, `{title}`, `{album}` and `{year}` are replaced by
//! sanitized tag values. A missing or blank value expands to `Unknown`.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::models::{non_blank, Metadata};

/// Placeholder value for a missing field in a folder pattern
pub const UNKNOWN_PLACEHOLDER: &str = "Unknown";
const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_TITLE: &str = "Unknown Title";

#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("File not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Target already exists: {0}")]
    TargetExists(PathBuf),

    #[error("Invalid folder pattern '{0}': {1}")]
    InvalidPattern(String, String),

    #[error("Failed to move {0}: {1}")]
    Io(PathBuf, String),
}

/// Keep alphanumerics, space and `-`; everything else becomes `_`
pub fn sanitize_folder_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' || c == '-' { c } else { '_' })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Like [`sanitize_folder_component`] but also keeps `.`
pub fn sanitize_file_stem(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Relative folder path for `metadata` under `pattern`
///
/// `/` separates nested folders; empty segments are dropped. Absolute
/// patterns and `..` segments are rejected.
pub fn expand_folder_pattern(pattern: &str, metadata: &Metadata) -> Result<PathBuf, OrganizeError> {
    let invalid = |reason: &str| OrganizeError::InvalidPattern(pattern.to_string(), reason.to_string());

    if pattern.starts_with('/') || pattern.starts_with('\\') || Path::new(pattern).is_absolute() {
        return Err(invalid("must be relative"));
    }

    let year = metadata.year.map(|y| y.to_string());
    let field = |value: Option<&str>| {
        non_blank(value)
            .map(sanitize_folder_component)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| UNKNOWN_PLACEHOLDER.to_string())
    };

    let mut relative = PathBuf::new();
    for segment in pattern.split(['/', '\\']) {
        if segment.trim() == ".." {
            return Err(invalid("must not contain '..'"));
        }

        let expanded = segment
            .replace("{genre}", &field(metadata.genre.as_deref()))
            .replace("{artist}", &field(metadata.artist.as_deref()))
            .replace("{title}", &field(metadata.title.as_deref()))
            .replace("{album}", &field(metadata.album.as_deref()))
            .replace("{year}", &field(year.as_deref()));
        let expanded = expanded.trim();

        if expanded.is_empty() || expanded == "." {
            continue;
        }
        if expanded == ".." {
            return Err(invalid("must not contain '..'"));
        }
        relative.push(expanded);
    }

    if relative.as_os_str().is_empty() {
        return Err(invalid("expands to an empty path"));
    }
    // Only plain folder names below the base
    if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Err(invalid("must be relative"));
    }

    Ok(relative)
}

/// File name `"<Artist> - <Title>.<ext>"` for `metadata`
pub fn rename_target_name(metadata: &Metadata, extension: &str) -> String {
    let artist = non_blank(metadata.artist.as_deref())
        .map(sanitize_file_stem)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
    let title = non_blank(metadata.title.as_deref())
        .map(sanitize_file_stem)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    if extension.is_empty() {
        format!("{} - {}", artist, title)
    } else {
        format!("{} - {}.{}", artist, title, extension)
    }
}

/// Rename `path` in place following the artist/title convention
///
/// A file already carrying the target name is left alone.
pub fn rename_file(path: &Path, metadata: &Metadata) -> Result<PathBuf, OrganizeError> {
    if !path.is_file() {
        return Err(OrganizeError::SourceMissing(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let target = dir.join(rename_target_name(metadata, &extension));

    move_file(path, &target)
}

/// Move `path` under `base_folder` following `pattern`
pub fn organize_file(
    path: &Path,
    metadata: &Metadata,
    base_folder: &Path,
    pattern: &str,
) -> Result<PathBuf, OrganizeError> {
    if !path.is_file() {
        return Err(OrganizeError::SourceMissing(path.to_path_buf()));
    }

    let relative = expand_folder_pattern(pattern, metadata)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| OrganizeError::SourceMissing(path.to_path_buf()))?;
    let target_dir = base_folder.join(relative);
    let target = target_dir.join(file_name);

    if target != path {
        std::fs::create_dir_all(&target_dir)
            .map_err(|e| OrganizeError::Io(target_dir.clone(), e.to_string()))?;
    }

    move_file(path, &target)
}

fn move_file(source: &Path, target: &Path) -> Result<PathBuf, OrganizeError> {
    if target == source {
        return Ok(target.to_path_buf());
    }
    if target.exists() {
        return Err(OrganizeError::TargetExists(target.to_path_buf()));
    }

    std::fs::rename(source, target)
        .map_err(|e| OrganizeError::Io(source.to_path_buf(), e.to_string()))?;

    tracing::debug!(
        from = %source.display(),
        to = %target.display(),
        "File moved"
    );
    Ok(target.to_path_buf())
}
