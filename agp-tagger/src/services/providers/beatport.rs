//! Beatport catalog provider
//!
//! Password-grant OAuth against the public v4 API. Beatport's genre and
//! sub-genre taxonomy is curated per track, so matches are High confidence.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{build_http_client, check_status, no_match, CachedToken, MetadataProvider, ProviderError};
use crate::models::{Confidence, MetadataResult};

const TOKEN_URL: &str = "https://api.beatport.com/v4/auth/o/token/";
const TRACKS_URL: &str = "https://api.beatport.com/v4/catalog/tracks/";
/// Public client id of the Beatport web player
const CLIENT_ID: &str = "oeGScrHHsv1K1vO2Mby3sHQ7oZNWpViH";
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;
const EXPIRY_MARGIN_SECS: u64 = 300;
const PROVIDER_NAME: &str = "Beatport";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    #[serde(default)]
    genre: Option<NamedEntry>,
    #[serde(default)]
    sub_genre: Option<NamedEntry>,
    #[serde(default)]
    artists: Vec<NamedEntry>,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

pub struct BeatportProvider {
    username: Option<String>,
    password: Option<String>,
    http_client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl BeatportProvider {
    pub fn new(username: Option<String>, password: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            username,
            password,
            http_client: build_http_client()?,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let (username, password) = match (&self.username, &self.password) {
            (Some(user), Some(pass)) => (user.as_str(), pass.as_str()),
            _ => return Err(ProviderError::NotConfigured(PROVIDER_NAME.to_string())),
        };

        tracing::debug!("Requesting Beatport access token");

        let response = self
            .http_client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "password"),
                ("client_id", CLIENT_ID),
                ("username", username),
                ("password", password),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let token: TokenResponse = check_status(response, PROVIDER_NAME)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        *cached = Some(CachedToken::new(
            token.access_token.clone(),
            token_lifetime(token.expires_in),
        ));

        Ok(token.access_token)
    }
}

/// Usable lifetime: server expiry minus a safety margin
fn token_lifetime(expires_in: Option<u64>) -> Duration {
    let expires_in = expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    Duration::from_secs(expires_in.saturating_sub(EXPIRY_MARGIN_SECS))
}

#[async_trait]
impl MetadataProvider for BeatportProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn is_configured(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    async fn search_track(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<MetadataResult, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(PROVIDER_NAME.to_string()));
        }

        let access_token = self.access_token().await?;
        let query = format!("{} {}", artist, title);

        let response = self
            .http_client
            .get(TRACKS_URL)
            .bearer_auth(&access_token)
            .query(&[("q", query.as_str()), ("per_page", "1")])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let search: SearchResponse = check_status(response, PROVIDER_NAME)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(to_result(search, artist))
    }
}

fn to_result(search: SearchResponse, query_artist: &str) -> MetadataResult {
    let Some(track) = search.results.into_iter().next() else {
        return no_match(PROVIDER_NAME, query_artist);
    };

    let artist = track
        .artists
        .into_iter()
        .next()
        .map(|a| a.name)
        .unwrap_or_else(|| query_artist.to_string());

    let genre = track.sub_genre.or(track.genre).map(|g| g.name);
    let confidence = if genre.is_some() {
        Confidence::High
    } else {
        Confidence::Low
    };

    MetadataResult {
        genre,
        artist: Some(artist),
        confidence,
        source: PROVIDER_NAME.to_string(),
    }
}
