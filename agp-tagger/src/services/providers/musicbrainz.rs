//! MusicBrainz recording search
//!
//! No credentials required. MusicBrainz asks for at most one request per
//! second and a descriptive User-Agent; both are enforced here.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;

use super::{build_http_client, check_status, no_match, MetadataProvider, ProviderError};
use crate::models::{Confidence, MetadataResult};

const API_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const PROVIDER_NAME: &str = "MusicBrainz";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
struct Recording {
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    tags: Vec<NamedEntry>,
    #[serde(default)]
    genres: Vec<NamedEntry>,
}

#[derive(Debug, Deserialize)]
struct ArtistCredit {
    name: String,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

pub struct MusicBrainzProvider {
    http_client: reqwest::Client,
    /// 1 request per second
    rate_limiter: DefaultDirectRateLimiter,
}

impl MusicBrainzProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Ok(Self {
            http_client: build_http_client()?,
            rate_limiter: RateLimiter::direct(Quota::per_second(NonZeroU32::MIN)),
        })
    }
}

#[async_trait]
impl MetadataProvider for MusicBrainzProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn search_track(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<MetadataResult, ProviderError> {
        self.rate_limiter.until_ready().await;

        let query = format!("artist:{} AND recording:{}", artist, title);
        tracing::debug!(query = %query, "Querying MusicBrainz");

        let response = self
            .http_client
            .get(format!("{}/recording", API_BASE_URL))
            .query(&[
                ("query", query.as_str()),
                ("fmt", "json"),
                ("limit", "1"),
                ("inc", "tags+genres"),
            ])
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
    let Some(recording) = search.recordings.into_iter().next() else {
        return no_match(PROVIDER_NAME, query_artist);
    };

    let artist = recording
        .artist_credit
        .into_iter()
        .next()
        .map(|credit| credit.name)
        .unwrap_or_else(|| query_artist.to_string());

    // Curated genres first, folksonomy tags as fallback
    let genre = recording
        .genres
        .into_iter()
        .next()
        .or_else(|| recording.tags.into_iter().next())
        .map(|entry| entry.name);

    let confidence = if genre.is_some() {
        Confidence::Medium
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
