//! HTTP client for the companion server
//!
//! Four endpoints, all JSON:
//! - `GET  /load_playlist`  -> `["A.mp3", ...]`
//! - `POST /save_playlist`  <- `["A.mp3", ...]` (replaces the stored list)
//! - `POST /search_spotify` <- `{query}` -> `[descriptor, ...]` or `{error}`
//! - `POST /get_lyrics`     <- `{track_name, artist_name}` -> lyrics metadata or `{error, message}`
//!
//! The pipelines only see the backend traits, so tests swap in doubles.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::audio::MediaSource;
use crate::error::{LyricsError, PersistError, SearchError};
use crate::{log_api_request, log_api_result};
use super::lyrics::LyricsInfo;
use super::types::Track;

/// Persisted playlist endpoint pair
#[async_trait]
pub trait PlaylistBackend: Send + Sync {
    async fn load(&self) -> Result<Vec<String>, PersistError>;
    async fn save(&self, names: &[String]) -> Result<(), PersistError>;
}

/// Remote track search. An empty `Vec` means "no results".
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Track>, SearchError>;
}

#[async_trait]
pub trait LyricsBackend: Send + Sync {
    async fn lyrics(&self, track_name: &str, artist_name: &str) -> Result<LyricsInfo, LyricsError>;
}

/// Track descriptor returned by the search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TrackDescriptor {
    pub name: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub has_preview: bool,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub spotify_url: Option<String>,
}

impl TrackDescriptor {
    pub fn into_track(self) -> Track {
        let preview = self.preview_url.filter(|url| !url.is_empty());
        let id = preview
            .clone()
            .or_else(|| self.spotify_url.clone())
            .unwrap_or_else(|| match &self.artist {
                Some(artist) => format!("{} - {}", self.name, artist),
                None => self.name.clone(),
            });

        Track {
            id,
            name: self.name,
            artist: self.artist,
            artwork_url: self.image,
            preview_available: self.has_preview && preview.is_some(),
            source: preview.map(MediaSource::Remote),
        }
    }
}

/// Lyrics metadata as sent by the server
#[derive(Debug, Clone, Deserialize)]
struct LyricsPayload {
    title: String,
    artist: String,
    #[serde(default)]
    album: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    lyrics_url: Option<String>,
}

/// `{error, message}` shaped failure body
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Serialize)]
struct LyricsRequest<'a> {
    track_name: &'a str,
    artist_name: &'a str,
}

/// Classify a search response.
///
/// Unreadable bodies are transport failures; non-2xx statuses and bodies with
/// an `error` field are domain failures; anything else is the result list in
/// server order.
pub fn classify_search_response(status: u16, body: &str) -> Result<Vec<Track>, SearchError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| SearchError::Transport(format!("unreadable response: {}", e)))?;

    let embedded_error = value
        .get("error")
        .and_then(|e| e.as_str())
        .map(|e| e.to_string());

    if !(200..300).contains(&status) {
        return Err(SearchError::Domain(
            embedded_error.unwrap_or_else(|| "Unknown error occurred".to_string()),
        ));
    }
    if let Some(error) = embedded_error {
        return Err(SearchError::Domain(error));
    }

    let descriptors: Vec<TrackDescriptor> = serde_json::from_value(value)
        .map_err(|e| SearchError::Transport(format!("unexpected response shape: {}", e)))?;

    Ok(descriptors.into_iter().map(TrackDescriptor::into_track).collect())
}

/// Interpret a lyrics response. Failure text prefers `message`, then `error`.
pub fn parse_lyrics_response(status: u16, body: &str) -> Result<LyricsInfo, LyricsError> {
    if !(200..300).contains(&status) {
        let error: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let text = error
            .message
            .or(error.error)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status));
        return Err(LyricsError::Service(text));
    }

    let payload: LyricsPayload =
        serde_json::from_str(body).map_err(|e| LyricsError::Network(e.to_string()))?;

    Ok(LyricsInfo {
        release_year: payload.release_date.as_deref().and_then(super::lyrics::release_year),
        title: payload.title,
        artist: payload.artist,
        album: payload.album.unwrap_or_else(|| "Unknown Album".to_string()),
        image_url: payload.image_url,
        lyrics_url: payload.lyrics_url,
    })
}

/// reqwest-backed client for all four endpoints
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl PlaylistBackend for ApiClient {
    async fn load(&self) -> Result<Vec<String>, PersistError> {
        log_api_request!("load_playlist");
        let result: Result<Vec<String>, PersistError> = async {
            let response = self.http.get(self.url("load_playlist")).send().await?;
            if !response.status().is_success() {
                return Err(PersistError::Status(response.status().as_u16()));
            }
            Ok(response.json::<Vec<String>>().await?)
        }
        .await;
        log_api_result!("load_playlist", result);
        result
    }

    async fn save(&self, names: &[String]) -> Result<(), PersistError> {
        log_api_request!("save_playlist", count = names.len());
        let result: Result<(), PersistError> = async {
            let response = self
                .http
                .post(self.url("save_playlist"))
                .json(names)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(PersistError::Status(response.status().as_u16()));
            }
            Ok(())
        }
        .await;
        log_api_result!("save_playlist", result);
        result
    }
}

#[async_trait]
impl SearchBackend for ApiClient {
    async fn search(&self, query: &str) -> Result<Vec<Track>, SearchError> {
        log_api_request!("search", query = query);
        let result: Result<Vec<Track>, SearchError> = async {
            let response = self
                .http
                .post(self.url("search_spotify"))
                .json(&SearchRequest { query })
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            classify_search_response(status, &body)
        }
        .await;
        log_api_result!("search", result);
        result
    }
}

#[async_trait]
impl LyricsBackend for ApiClient {
    async fn lyrics(&self, track_name: &str, artist_name: &str) -> Result<LyricsInfo, LyricsError> {
        log_api_request!("lyrics", track = track_name, artist = artist_name);
        let result: Result<LyricsInfo, LyricsError> = async {
            let response = self
                .http
                .post(self.url("get_lyrics"))
                .json(&LyricsRequest { track_name, artist_name })
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            parse_lyrics_response(status, &body)
        }
        .await;
        log_api_result!("lyrics", result);
        result
    }
}
