//! Shared test doubles for agp-tagger integration tests
//!
//! - `MockLookup`: scripted per-(artist, title) lookup results
//! - `MockProvider`: scripted single provider
//! - `MockLibrary`: in-memory disk boundary that records every call

#![allow(dead_code)]

use agp_common::EventBus;
use agp_tagger::models::{AudioFile, Confidence, EnhancedAudioFile, Metadata, MetadataResult};
use agp_tagger::services::tag_store::TagError;
use agp_tagger::services::{
    AudioLibrary, LibraryError, LookupError, MetadataLookup, MetadataProvider, ProgressReporter,
    ProviderError, WorkflowOrchestrator,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub fn metadata(artist: Option<&str>, title: Option<&str>, genre: Option<&str>) -> Metadata {
    Metadata {
        artist: artist.map(str::to_string),
        title: title.map(str::to_string),
        genre: genre.map(str::to_string),
        ..Default::default()
    }
}

pub fn suggestion(genre: Option<&str>, artist: Option<&str>, confidence: Confidence, source: &str) -> MetadataResult {
    MetadataResult {
        genre: genre.map(str::to_string),
        artist: artist.map(str::to_string),
        confidence,
        source: source.to_string(),
    }
}

pub fn audio_file(path: &str, meta: Option<Metadata>) -> EnhancedAudioFile {
    AudioFile::new(PathBuf::from(path), meta).into()
}

/// Inventory entry that already carries ranked suggestions
pub fn annotated(path: &str, meta: Metadata, suggestions: Vec<MetadataResult>) -> EnhancedAudioFile {
    let mut entry = audio_file(path, Some(meta));
    entry.suggested_metadata = Some(suggestions);
    entry
}

// =============================================================================
// MockLookup
// =============================================================================

#[derive(Clone)]
pub enum LookupScript {
    Results(Vec<MetadataResult>),
    Fail(String),
    Panic,
}

/// Scripted [`MetadataLookup`]; unscripted keys return no results
#[derive(Default)]
pub struct MockLookup {
    scripts: HashMap<(String, String), LookupScript>,
    calls: Mutex<Vec<(String, String)>>,
    /// Cancel this token once the given number of lookups has run
    cancel_after: Option<(usize, CancellationToken)>,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, artist: &str, title: &str, script: LookupScript) -> Self {
        self.scripts
            .insert((artist.to_string(), title.to_string()), script);
        self
    }

    pub fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataLookup for MockLookup {
    async fn fetch_metadata(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Vec<MetadataResult>, LookupError> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((artist.to_string(), title.to_string()));
            calls.len()
        };
        if let Some((limit, token)) = &self.cancel_after {
            if count >= *limit {
                token.cancel();
            }
        }

        match self.scripts.get(&(artist.to_string(), title.to_string())) {
            Some(LookupScript::Results(results)) => Ok(results.clone()),
            Some(LookupScript::Fail(message)) => Err(LookupError::Failed(message.clone())),
            Some(LookupScript::Panic) => panic!("scripted lookup panic"),
            None => Ok(Vec::new()),
        }
    }
}

// =============================================================================
// MockProvider
// =============================================================================

pub struct MockProvider {
    pub name: &'static str,
    pub configured: bool,
    /// `Err` holds the message of a network failure
    pub response: Result<MetadataResult, String>,
    pub calls: Mutex<usize>,
}

impl MockProvider {
    pub fn ok(name: &'static str, result: MetadataResult) -> Arc<Self> {
        Arc::new(Self {
            name,
            configured: true,
            response: Ok(result),
            calls: Mutex::new(0),
        })
    }

    pub fn failing(name: &'static str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            configured: true,
            response: Err(message.to_string()),
            calls: Mutex::new(0),
        })
    }

    pub fn unconfigured(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            configured: false,
            response: Err("not configured".to_string()),
            calls: Mutex::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl MetadataProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn search_track(&self, _artist: &str, _title: &str) -> Result<MetadataResult, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        self.response.clone().map_err(ProviderError::Network)
    }
}

// =============================================================================
// MockLibrary
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum LibraryCall {
    Scan(PathBuf),
    Update { path: PathBuf, metadata: Metadata, backup: bool },
    Rename(PathBuf),
    Organize { path: PathBuf, base: PathBuf, pattern: String },
    Restore { backup: PathBuf, original: PathBuf },
}

/// In-memory [`AudioLibrary`]
///
/// Renames produce `<dir>/<Artist> - <Title>.<ext>`, organize produces
/// `<base>/<genre>/<filename>`. Failures are injected per path.
#[derive(Default)]
pub struct MockLibrary {
    pub scan_result: Mutex<Option<Vec<AudioFile>>>,
    pub panic_on_scan: bool,
    pub fail_writes: HashSet<PathBuf>,
    pub fail_renames: HashSet<PathBuf>,
    pub fail_organize: HashSet<PathBuf>,
    pub restore_result: Option<Metadata>,
    calls: Mutex<Vec<LibraryCall>>,
}

impl MockLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan(files: Vec<AudioFile>) -> Self {
        Self {
            scan_result: Mutex::new(Some(files)),
            ..Default::default()
        }
    }

    pub fn panicking_scan() -> Self {
        Self {
            panic_on_scan: true,
            ..Default::default()
        }
    }

    pub fn fail_write(mut self, path: &str) -> Self {
        self.fail_writes.insert(PathBuf::from(path));
        self
    }

    pub fn fail_rename(mut self, path: &str) -> Self {
        self.fail_renames.insert(PathBuf::from(path));
        self
    }

    pub fn fail_organize(mut self, path: &str) -> Self {
        self.fail_organize.insert(PathBuf::from(path));
        self
    }

    pub fn restore_to(mut self, metadata: Metadata) -> Self {
        self.restore_result = Some(metadata);
        self
    }

    pub fn calls(&self) -> Vec<LibraryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn renames(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, LibraryCall::Rename(_)))
            .count()
    }

    fn record(&self, call: LibraryCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AudioLibrary for MockLibrary {
    async fn scan_folder(&self, path: &Path) -> Result<Vec<AudioFile>, LibraryError> {
        self.record(LibraryCall::Scan(path.to_path_buf()));
        if self.panic_on_scan {
            panic!("scripted scan panic");
        }
        self.scan_result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| {
                LibraryError::Scan(agp_tagger::services::ScanError::PathNotFound(path.to_path_buf()))
            })
    }

    async fn update_metadata(&self, path: &Path, metadata: &Metadata, backup: bool) -> Result<(), LibraryError> {
        self.record(LibraryCall::Update {
            path: path.to_path_buf(),
            metadata: metadata.clone(),
            backup,
        });
        if self.fail_writes.contains(path) {
            return Err(TagError::Write(path.to_path_buf(), "read-only file".to_string()).into());
        }
        Ok(())
    }

    async fn rename_file(&self, path: &Path, metadata: &Metadata) -> Result<PathBuf, LibraryError> {
        self.record(LibraryCall::Rename(path.to_path_buf()));
        if self.fail_renames.contains(path) {
            return Err(LibraryError::TaskFailed("rename refused".to_string()));
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("mp3");
        let name = format!(
            "{} - {}.{}",
            metadata.artist.as_deref().unwrap_or("Unknown Artist"),
            metadata.title.as_deref().unwrap_or("Unknown Title"),
            ext
        );
        Ok(path.with_file_name(name))
    }

    async fn organize_file(
        &self,
        path: &Path,
        metadata: &Metadata,
        base_folder: &Path,
        pattern: &str,
    ) -> Result<PathBuf, LibraryError> {
        self.record(LibraryCall::Organize {
            path: path.to_path_buf(),
            base: base_folder.to_path_buf(),
            pattern: pattern.to_string(),
        });
        if self.fail_organize.contains(path) {
            return Err(LibraryError::TaskFailed("organize refused".to_string()));
        }
        let genre = metadata.genre.as_deref().unwrap_or("Unknown");
        let file_name = path.file_name().map(PathBuf::from).unwrap_or_default();
        Ok(base_folder.join(genre).join(file_name))
    }

    async fn restore_from_backup(&self, backup_path: &Path, original_path: &Path) -> Result<Metadata, LibraryError> {
        self.record(LibraryCall::Restore {
            backup: backup_path.to_path_buf(),
            original: original_path.to_path_buf(),
        });
        Ok(self.restore_result.clone().unwrap_or_default())
    }
}

/// Orchestrator wired to test doubles, plus its reporter and bus
pub fn orchestrator(
    library: Arc<dyn AudioLibrary>,
    lookup: Arc<dyn MetadataLookup>,
) -> (WorkflowOrchestrator, ProgressReporter, EventBus) {
    let event_bus = EventBus::new(256);
    let reporter = ProgressReporter::new(event_bus.clone());
    let orchestrator = WorkflowOrchestrator::new(library, lookup, reporter.clone(), event_bus.clone());
    (orchestrator, reporter, event_bus)
}
