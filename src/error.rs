//! Error types for the player components
//!
//! Each component owns its failure taxonomy. None of them crosses into another
//! component: a lyrics failure never pauses playback, a persist failure never
//! reverts the visible playlist.

use thiserror::Error;

/// The audio adapter failed to load or start a track
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Track has no playable source: {0}")]
    InvalidSource(String),

    #[error("Error playing the audio file: {0}")]
    Load(String),

    #[error("Playback was rejected: {0}")]
    PlayRejected(String),

    #[error("Audio engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// Failure of a remote track search. An empty result set is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The request never produced a readable response
    #[error("Error connecting to search service: {0}")]
    Transport(String),

    /// The service answered with a structured error
    #[error("{0}")]
    Domain(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        SearchError::Transport(e.to_string())
    }
}

/// Playlist persistence failure. Logged only, never shown and never rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Invalid playlist payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for PersistError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            PersistError::Decode(e.to_string())
        } else {
            PersistError::Network(e.to_string())
        }
    }
}

/// Lyrics lookup failure, rendered inline in the lyrics panel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LyricsError {
    #[error("Error loading lyrics: {0}")]
    Network(String),

    #[error("{0}")]
    Service(String),
}

impl From<reqwest::Error> for LyricsError {
    fn from(e: reqwest::Error) -> Self {
        LyricsError::Network(e.to_string())
    }
}
