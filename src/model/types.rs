//! Core type definitions for the application

use std::path::Path;

use tokio::time::Instant;

use crate::audio::MediaSource;

/// Placeholder artist line shown for files from the local library
pub const LOCAL_ARTIST_PLACEHOLDER: &str = "Local File";
/// Artwork reference used when a track has none
pub const DEFAULT_ARTWORK: &str = "default-album.png";

/// A playable (or at least displayable) song. Identity is `id`.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Source path or remote URL
    pub id: String,
    pub name: String,
    pub artist: Option<String>,
    pub artwork_url: Option<String>,
    pub preview_available: bool,
    pub source: Option<MediaSource>,
}

impl Track {
    /// Track backed by a file in the local library
    pub fn local(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            id: path.display().to_string(),
            name,
            artist: None,
            artwork_url: None,
            preview_available: true,
            source: Some(MediaSource::LocalFile(path.to_path_buf())),
        }
    }

    pub fn is_playable(&self) -> bool {
        !self.id.is_empty() && self.source.is_some()
    }

    pub fn is_local(&self) -> bool {
        matches!(self.source, Some(MediaSource::LocalFile(_)))
    }
}

/// Which section of the UI is currently active/focused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveSection {
    Search,
    Filter,
    Library,
    Playlist,
    Results,
}

impl ActiveSection {
    pub fn next(self) -> Self {
        match self {
            ActiveSection::Search => ActiveSection::Filter,
            ActiveSection::Filter => ActiveSection::Library,
            ActiveSection::Library => ActiveSection::Playlist,
            ActiveSection::Playlist => ActiveSection::Results,
            ActiveSection::Results => ActiveSection::Search,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ActiveSection::Search => ActiveSection::Results,
            ActiveSection::Filter => ActiveSection::Search,
            ActiveSection::Library => ActiveSection::Filter,
            ActiveSection::Playlist => ActiveSection::Library,
            ActiveSection::Results => ActiveSection::Playlist,
        }
    }

    /// Sections that capture typed characters
    pub fn is_text_input(self) -> bool {
        matches!(self, ActiveSection::Search | ActiveSection::Filter)
    }
}

/// Three-level volume indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeLevel {
    Muted,
    Low,
    Full,
}

impl VolumeLevel {
    pub fn from_volume(volume: f32) -> Self {
        if volume <= 0.0 {
            VolumeLevel::Muted
        } else if volume < 0.5 {
            VolumeLevel::Low
        } else {
            VolumeLevel::Full
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            VolumeLevel::Muted => "🔇",
            VolumeLevel::Low => "🔉",
            VolumeLevel::Full => "🔊",
        }
    }
}

/// Color scheme. The visualizer reads its gradient from here every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

pub type Rgb = (u8, u8, u8);

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn primary(self) -> Rgb {
        match self {
            Theme::Dark => (187, 134, 252),
            Theme::Light => (98, 0, 238),
        }
    }

    pub fn secondary(self) -> Rgb {
        match self {
            Theme::Dark => (3, 218, 198),
            Theme::Light => (1, 135, 134),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "Dark",
            Theme::Light => "Light",
        }
    }
}

/// UI state for the application
#[derive(Clone)]
pub struct UiState {
    pub active_section: ActiveSection,
    pub search_query: String,
    pub filter_query: String,
    pub library_selected: usize,
    pub playlist_selected: usize,
    pub results_selected: usize,
    pub theme: Theme,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub notice: Option<String>,
    pub notice_timestamp: Option<Instant>,
    pub show_help_popup: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_section: ActiveSection::Library,
            search_query: String::new(),
            filter_query: String::new(),
            library_selected: 0,
            playlist_selected: 0,
            results_selected: 0,
            theme: Theme::default(),
            error_message: None,
            error_timestamp: None,
            notice: None,
            notice_timestamp: None,
            show_help_popup: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_icon_thresholds() {
        assert_eq!(VolumeLevel::from_volume(0.0), VolumeLevel::Muted);
        assert_eq!(VolumeLevel::from_volume(0.3), VolumeLevel::Low);
        assert_eq!(VolumeLevel::from_volume(0.5), VolumeLevel::Full);
        assert_eq!(VolumeLevel::from_volume(0.7), VolumeLevel::Full);
    }

    #[test]
    fn local_track_uses_file_name_and_path_identity() {
        let track = Track::local("music/A.mp3");
        assert_eq!(track.name, "A.mp3");
        assert_eq!(track.id, Path::new("music/A.mp3").display().to_string());
        assert!(track.is_playable());
        assert!(track.is_local());
    }

    #[test]
    fn section_cycle_round_trips() {
        let mut section = ActiveSection::Search;
        for _ in 0..5 {
            section = section.next();
        }
        assert_eq!(section, ActiveSection::Search);
        assert_eq!(ActiveSection::Search.prev().next(), ActiveSection::Search);
    }
}
