//! Service modules for the library correction workflow
//!
//! - Metadata providers, aggregation and ranking
//! - Disk collaborators: scanner, tag store, organizer
//! - Library session, progress reporting and the pass orchestrator

pub mod audio_library;
pub mod duplicate_finder;
pub mod file_organizer;
pub mod file_scanner;
pub mod library_session;
pub mod metadata_aggregator;
pub mod progress_reporter;
pub mod providers;
pub mod suggestion_ranker;
pub mod tag_store;
pub mod workflow_orchestrator;

pub use audio_library::{AudioLibrary, DiskLibrary, LibraryError};
pub use duplicate_finder::find_duplicates;
pub use file_organizer::OrganizeError;
pub use file_scanner::{FileScanner, ScanError};
pub use library_session::{LibrarySession, PassGuard, SessionError};
pub use metadata_aggregator::{LookupError, MetadataAggregator, MetadataLookup};
pub use progress_reporter::ProgressReporter;
pub use providers::{MetadataProvider, ProviderError};
pub use tag_store::TagError;
pub use workflow_orchestrator::{WorkflowError, WorkflowOrchestrator};
