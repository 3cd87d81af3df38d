//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the application.
//! It is organized into submodules by responsibility:
//!
//! - `types`: Core type definitions (tracks, sections, theme, UI state)
//! - `playback`: Playback state machine over the audio adapter
//! - `spectrum`: Spectrum sampler and bar layout
//! - `playlist`: User playlist with optimistic persistence
//! - `search`: Debounced remote search with stale-reply suppression
//! - `lyrics`: Lyrics lookup for the selected track
//! - `library`: Local music files and their filter
//! - `debounce`: Shared trailing-edge debounce timer
//! - `api_client`: HTTP client for the companion server
//! - `app_model`: Main application model with state management methods

mod types;
mod playback;
mod spectrum;
mod playlist;
mod search;
mod lyrics;
mod library;
mod debounce;
mod api_client;
mod app_model;

// Re-export all public types for convenient access
pub use types::{ActiveSection, Rgb, Theme, Track, UiState};

pub use playback::{EndedAction, PlaybackController, PlaybackInfo, PlaybackSignal, PlaybackStatus};

pub use spectrum::{gradient_at, DrawCommand, CELL_RESOLUTION};

pub use playlist::PlaylistStore;

pub use search::{SearchPipeline, SearchSession, SearchStatus};

pub use lyrics::{LyricsPipeline, LyricsStatus, LYRICS_CONFIG_HINT};

pub use library::{scan as scan_library, Library};

pub use api_client::ApiClient;

pub use app_model::{AppModel, ViewState};
