//! agp-tagger library interface
//!
//! Exposes the service internals for integration testing

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use agp_common::EventBus;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::{ProviderCredentials, SettingsStore};
use crate::models::AppSettings;
use crate::services::{
    AudioLibrary, DiskLibrary, LibrarySession, MetadataAggregator, MetadataLookup,
    ProgressReporter, ProviderError, WorkflowOrchestrator,
};

/// Builds the lookup used by a scan pass from the settings current at pass start
pub type LookupFactory =
    Arc<dyn Fn(&AppSettings) -> Result<Arc<dyn MetadataLookup>, ProviderError> + Send + Sync>;

/// Production lookup: the three providers, credentials from env then settings
pub fn provider_lookup_factory() -> LookupFactory {
    Arc::new(
        |settings: &AppSettings| -> Result<Arc<dyn MetadataLookup>, ProviderError> {
            let credentials = ProviderCredentials::resolve(settings);
            let aggregator = MetadataAggregator::from_credentials(&credentials)?;
            tracing::debug!(
                providers = ?aggregator.configured_providers(),
                "Metadata lookup built"
            );
            Ok(Arc::new(aggregator))
        },
    )
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Inventory and the single active pass
    pub session: Arc<LibrarySession>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    pub reporter: ProgressReporter,
    /// Disk boundary (scan, tag writes, rename, organize, restore)
    pub library: Arc<dyn AudioLibrary>,
    pub lookup_factory: LookupFactory,
    pub settings_store: SettingsStore,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// State wired to the real disk and the real providers
    pub fn new(event_bus: EventBus, settings_store: SettingsStore) -> Self {
        Self::with_collaborators(
            event_bus,
            settings_store,
            Arc::new(DiskLibrary::new()),
            provider_lookup_factory(),
        )
    }

    pub fn with_collaborators(
        event_bus: EventBus,
        settings_store: SettingsStore,
        library: Arc<dyn AudioLibrary>,
        lookup_factory: LookupFactory,
    ) -> Self {
        Self {
            session: Arc::new(LibrarySession::new()),
            reporter: ProgressReporter::new(event_bus.clone()),
            event_bus,
            library,
            lookup_factory,
            settings_store,
            startup_time: Utc::now(),
        }
    }

    /// Orchestrator for one pass
    pub fn orchestrator(&self, lookup: Arc<dyn MetadataLookup>) -> WorkflowOrchestrator {
        WorkflowOrchestrator::new(
            Arc::clone(&self.library),
            lookup,
            self.reporter.clone(),
            self.event_bus.clone(),
        )
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::library_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
