//! Lyrics lookup for the selected track
//!
//! One request per selection, no debounce. Calls are tagged with a token and
//! only the latest call may touch the panel, so a slow earlier reply never
//! replaces a newer one.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tokio::sync::Mutex;

use crate::error::LyricsError;
use super::api_client::LyricsBackend;

/// Shown under every lyrics failure
pub const LYRICS_CONFIG_HINT: &str = "Make sure GENIUS_ACCESS_TOKEN is configured in .env file";

#[derive(Clone, Debug, PartialEq)]
pub struct LyricsInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub release_year: Option<i32>,
    pub image_url: Option<String>,
    pub lyrics_url: Option<String>,
}

impl LyricsInfo {
    /// "Album • 2019" or just "Album"
    pub fn album_line(&self) -> String {
        match self.release_year {
            Some(year) => format!("{} • {}", self.album, year),
            None => self.album.clone(),
        }
    }
}

/// Year from a full date (`2019-11-29`) or a bare year (`2019`)
pub fn release_year(date: &str) -> Option<i32> {
    let date = date.trim();
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(parsed.year());
    }
    date.get(..4).and_then(|y| y.parse().ok())
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum LyricsStatus {
    #[default]
    Idle,
    Loading {
        track_name: String,
    },
    Loaded(LyricsInfo),
    Failed {
        message: String,
        hint: &'static str,
    },
}

#[derive(Default)]
struct LyricsSession {
    token: u64,
    status: LyricsStatus,
}

#[derive(Clone)]
pub struct LyricsPipeline {
    backend: Arc<dyn LyricsBackend>,
    session: Arc<Mutex<LyricsSession>>,
}

impl LyricsPipeline {
    pub fn new(backend: Arc<dyn LyricsBackend>) -> Self {
        Self {
            backend,
            session: Arc::new(Mutex::new(LyricsSession::default())),
        }
    }

    pub async fn status(&self) -> LyricsStatus {
        self.session.lock().await.status.clone()
    }

    /// Start a lookup. The panel switches to loading immediately; the reply is
    /// applied only if no newer lookup started in the meantime.
    pub async fn fetch(&self, track_name: &str, artist_name: &str) -> tokio::task::JoinHandle<()> {
        let token = {
            let mut session = self.session.lock().await;
            session.token += 1;
            session.status = LyricsStatus::Loading {
                track_name: track_name.to_string(),
            };
            session.token
        };

        tracing::debug!(track = track_name, artist = artist_name, token, "Fetching lyrics");

        let backend = Arc::clone(&self.backend);
        let session = Arc::clone(&self.session);
        let track_name = track_name.to_string();
        let artist_name = artist_name.to_string();

        tokio::spawn(async move {
            let result = backend.lyrics(&track_name, &artist_name).await;

            let mut session = session.lock().await;
            if session.token != token {
                tracing::debug!(token, current = session.token, "Discarding superseded lyrics reply");
                return;
            }
            session.status = match result {
                Ok(info) => LyricsStatus::Loaded(info),
                Err(e) => LyricsStatus::Failed {
                    message: failure_text(&e),
                    hint: LYRICS_CONFIG_HINT,
                },
            };
        })
    }
}

fn failure_text(error: &LyricsError) -> String {
    match error {
        LyricsError::Service(message) if !message.is_empty() => message.clone(),
        LyricsError::Service(_) => "Error loading lyrics. Please try again.".to_string(),
        LyricsError::Network(_) => error.to_string(),
    }
}
