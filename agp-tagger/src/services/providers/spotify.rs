//! Spotify Web API provider
//!
//! Client-credentials flow. The track search yields the primary artist;
//! the artist's first genre becomes the suggestion.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{build_http_client, check_status, no_match, CachedToken, MetadataProvider, ProviderError};
use crate::models::{Confidence, MetadataResult};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE_URL: &str = "https://api.spotify.com/v1";
const TOKEN_LIFETIME_SECS: u64 = 3000;
const PROVIDER_NAME: &str = "Spotify";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Tracks,
}

#[derive(Debug, Deserialize)]
struct Tracks {
    items: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    artists: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ArtistDetails {
    #[serde(default)]
    genres: Vec<String>,
}

pub struct SpotifyProvider {
    client_id: Option<String>,
    client_secret: Option<String>,
    http_client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyProvider {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client_id,
            client_secret,
            http_client: build_http_client()?,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let (client_id, client_secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => return Err(ProviderError::NotConfigured(PROVIDER_NAME.to_string())),
        };

        tracing::debug!("Requesting Spotify access token");

        let response = self
            .http_client
            .post(TOKEN_URL)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
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
            Duration::from_secs(TOKEN_LIFETIME_SECS),
        ));

        Ok(token.access_token)
    }
}

#[async_trait]
impl MetadataProvider for SpotifyProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
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
        let query = search_query(artist, title);

        let response = self
            .http_client
            .get(format!("{}/search", API_BASE_URL))
            .bearer_auth(&access_token)
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let search: SearchResponse = check_status(response, PROVIDER_NAME)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let Some(track_artist) = search
            .tracks
            .items
            .into_iter()
            .next()
            .and_then(|track| track.artists.into_iter().next())
        else {
            return Ok(no_match(PROVIDER_NAME, artist));
        };

        let response = self
            .http_client
            .get(format!("{}/artists/{}", API_BASE_URL, track_artist.id))
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            tracing::debug!(
                status = %response.status(),
                artist_id = %track_artist.id,
                "Spotify artist details unavailable"
            );
            return Ok(from_artist_genres(track_artist.name, &[]));
        }

        let details: ArtistDetails = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(from_artist_genres(track_artist.name, &details.genres))
    }
}

/// Field-filtered search query; multi-word values are quoted
fn search_query(artist: &str, title: &str) -> String {
    fn quote_if_multiword(value: &str) -> String {
        if value.contains(' ') {
            format!("\"{}\"", value)
        } else {
            value.to_string()
        }
    }

    format!(
        "artist:{} track:{}",
        quote_if_multiword(artist),
        quote_if_multiword(title)
    )
}

fn from_artist_genres(artist_name: String, genres: &[String]) -> MetadataResult {
    let genre = genres.first().cloned();
    let confidence = if genre.is_some() {
        Confidence::High
    } else {
        Confidence::Medium
    };

    MetadataResult {
        genre,
        artist: Some(artist_name),
        confidence,
        source: PROVIDER_NAME.to_string(),
    }
}
