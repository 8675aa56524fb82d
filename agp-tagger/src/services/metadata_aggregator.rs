//! Metadata provider aggregation
//!
//! Queries every configured provider for one artist/title key and collects
//! their results. One provider failing never affects its siblings: the
//! failure is logged and the provider simply contributes nothing.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ProviderCredentials;
use crate::models::{non_blank, MetadataResult};
use crate::services::providers::{
    BeatportProvider, MetadataProvider, MusicBrainzProvider, ProviderError, SpotifyProvider,
};
use crate::services::suggestion_ranker;

/// Per-file lookup errors
#[derive(Debug, Error)]
pub enum LookupError {
    /// Artist or title missing
    #[error("Lookup key incomplete: {0}")]
    IncompleteKey(String),

    #[error("Lookup failed: {0}")]
    Failed(String),
}

/// Aggregated and ranked suggestions for one artist/title key
///
/// This is the boundary the resolution driver sees. An empty result is a
/// valid answer, not an error.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn fetch_metadata(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Vec<MetadataResult>, LookupError>;
}

/// Fan-out over an ordered set of providers
pub struct MetadataAggregator {
    providers: Vec<Arc<dyn MetadataProvider>>,
}

impl MetadataAggregator {
    pub fn new(providers: Vec<Arc<dyn MetadataProvider>>) -> Self {
        Self { providers }
    }

    /// Standard provider set: Spotify, Beatport, MusicBrainz
    pub fn from_credentials(credentials: &ProviderCredentials) -> Result<Self, ProviderError> {
        let providers: Vec<Arc<dyn MetadataProvider>> = vec![
            Arc::new(SpotifyProvider::new(
                credentials.spotify_client_id.clone(),
                credentials.spotify_client_secret.clone(),
            )?),
            Arc::new(BeatportProvider::new(
                credentials.beatport_username.clone(),
                credentials.beatport_password.clone(),
            )?),
            Arc::new(MusicBrainzProvider::new()?),
        ];
        Ok(Self::new(providers))
    }

    /// Names of providers that will be queried
    pub fn configured_providers(&self) -> Vec<&'static str> {
        self.providers
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| p.name())
            .collect()
    }

    /// Query configured providers in order and collect their results
    ///
    /// Results keep provider order. Unconfigured providers are skipped
    /// silently; failing providers are logged and contribute nothing.
    pub async fn aggregate(&self, artist: &str, title: &str) -> Vec<MetadataResult> {
        let mut results = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            if !provider.is_configured() {
                continue;
            }

            match provider.search_track(artist, title).await {
                Ok(result) => {
                    debug!(
                        source = provider.name(),
                        genre = ?result.genre,
                        confidence = ?result.confidence,
                        "Provider returned suggestion"
                    );
                    results.push(result);
                }
                Err(e) => {
                    warn!(
                        source = provider.name(),
                        artist = %artist,
                        title = %title,
                        error = %e,
                        "Provider query failed"
                    );
                }
            }
        }

        results
    }
}

#[async_trait]
impl MetadataLookup for MetadataAggregator {
    async fn fetch_metadata(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Vec<MetadataResult>, LookupError> {
        let (Some(artist), Some(title)) = (non_blank(Some(artist)), non_blank(Some(title))) else {
            return Err(LookupError::IncompleteKey(format!(
                "artist={:?} title={:?}",
                artist, title
            )));
        };

        let results = self.aggregate(artist, title).await;
        Ok(suggestion_ranker::rank(results))
    }
}
