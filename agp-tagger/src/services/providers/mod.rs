//! Metadata providers
//!
//! Each provider answers one artist/title query with at most one
//! [`MetadataResult`]. Providers are independent: the aggregator queries
//! every configured provider and isolates their failures.
//!
//! * [`spotify::SpotifyProvider`] - artist genres from the streaming catalog
//! * [`beatport::BeatportProvider`] - track genre/sub-genre from the DJ catalog
//! * [`musicbrainz::MusicBrainzProvider`] - recording genres/tags, no credentials

use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::models::MetadataResult;

pub mod beatport;
pub mod musicbrainz;
pub mod spotify;

pub use beatport::BeatportProvider;
pub use musicbrainz::MusicBrainzProvider;
pub use spotify::SpotifyProvider;

pub(crate) const USER_AGENT: &str = "AutoGenrePro/0.1.0 ( contact@example.com )";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Provider query errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} credentials not configured")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// An external metadata source queried by artist/title
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short display name, e.g. "Spotify"
    fn name(&self) -> &'static str;

    /// Whether the provider has the configuration it needs
    ///
    /// Unconfigured providers are skipped by the aggregator, not errored.
    fn is_configured(&self) -> bool;

    /// Look up one track
    async fn search_track(&self, artist: &str, title: &str)
        -> Result<MetadataResult, ProviderError>;
}

/// Bearer token with its expiry
#[derive(Debug, Clone)]
pub(crate) struct CachedToken {
    pub access_token: String,
    pub expires_at: Instant,
}

impl CachedToken {
    pub fn new(access_token: String, lifetime: Duration) -> Self {
        Self {
            access_token,
            expires_at: Instant::now() + lifetime,
        }
    }

    /// Token still usable
    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

pub(crate) fn build_http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::Network(e.to_string()))
}

/// Map a non-success HTTP response to a [`ProviderError`]
pub(crate) async fn check_status(
    response: reqwest::Response,
    provider: &str,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ProviderError::Auth(format!("{} ({}): {}", provider, status, body)));
    }
    Err(ProviderError::Api(status.as_u16(), body))
}

/// Result for a query the provider answered without a match
pub(crate) fn no_match(provider: &str, artist: &str) -> MetadataResult {
    MetadataResult {
        genre: None,
        artist: Some(artist.to_string()),
        confidence: crate::models::Confidence::Low,
        source: format!("{} (No match)", provider),
    }
}
