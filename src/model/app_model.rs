//! Main application model with state management

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::library::Library;
use super::lyrics::{LyricsPipeline, LyricsStatus};
use super::playback::{PlaybackController, PlaybackInfo};
use super::playlist::{PlaylistEntry, PlaylistStore};
use super::search::{SearchPipeline, SearchSession};
use super::spectrum::{DrawCommand, SpectrumVisualizer};
use super::types::{ActiveSection, Theme, Track, UiState};

const MESSAGE_TTL: Duration = Duration::from_secs(5);

/// Everything one frame needs, captured up front so no lock is held while drawing
pub struct ViewState {
    pub playback: PlaybackInfo,
    pub ui: UiState,
    pub library: Vec<Track>,
    pub playlist: Vec<PlaylistEntry>,
    pub active_playlist_entry: Option<usize>,
    pub search: SearchSession,
    pub lyrics: LyricsStatus,
    pub spectrum: Option<Vec<DrawCommand>>,
    /// Activated, so an empty spectrum means no audio is flowing
    pub visualizer_active: bool,
    pub visualizer_disabled: bool,
}

/// Main application model containing all state
pub struct AppModel {
    pub playback: Arc<Mutex<PlaybackController>>,
    pub playlist: PlaylistStore,
    pub search: SearchPipeline,
    pub lyrics: LyricsPipeline,
    pub library: Library,
    visualizer: Arc<Mutex<SpectrumVisualizer>>,
    pub ui_state: Arc<Mutex<UiState>>,
    pub should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new(
        playback: PlaybackController,
        playlist: PlaylistStore,
        search: SearchPipeline,
        lyrics: LyricsPipeline,
        library: Library,
    ) -> Self {
        Self {
            playback: Arc::new(Mutex::new(playback)),
            playlist,
            search,
            lyrics,
            library,
            visualizer: Arc::new(Mutex::new(SpectrumVisualizer::new())),
            ui_state: Arc::new(Mutex::new(UiState::default())),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub async fn get_playback_info(&self) -> PlaybackInfo {
        self.playback.lock().await.snapshot()
    }

    /// Playlist followed by the filtered library; the pool shuffle draws from
    pub async fn visible_tracks(&self) -> Vec<Track> {
        let mut tracks = self.playlist.tracks().await;
        tracks.extend(self.library.visible().await);
        tracks
    }

    // ========================================================================
    // Visualizer
    // ========================================================================

    /// Hook up the analyser on the first user interaction
    pub async fn activate_visualizer(&self) {
        let mut visualizer = self.visualizer.lock().await;
        if visualizer.is_active() || visualizer.is_disabled() {
            return;
        }
        let tap = self.playback.lock().await.analysis_tap();
        visualizer.activate(tap);
    }

    pub async fn resize_visualizer(&self, columns: u16, rows: u16) {
        let mut visualizer = self.visualizer.lock().await;
        if visualizer.surface() != super::spectrum::Surface::from_cells(columns, rows) {
            visualizer.resize(columns, rows);
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    // ========================================================================
    // UI state
    // ========================================================================

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn cycle_section_forward(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.next();
    }

    pub async fn cycle_section_backward(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.prev();
    }

    pub async fn set_active_section(&self, section: ActiveSection) {
        let mut state = self.ui_state.lock().await;
        state.active_section = section;
    }

    pub async fn move_selection_up(&self) {
        let mut state = self.ui_state.lock().await;
        match state.active_section {
            ActiveSection::Library => state.library_selected = state.library_selected.saturating_sub(1),
            ActiveSection::Playlist => state.playlist_selected = state.playlist_selected.saturating_sub(1),
            ActiveSection::Results => state.results_selected = state.results_selected.saturating_sub(1),
            _ => {}
        }
    }

    pub async fn move_selection_down(&self) {
        let section = self.ui_state.lock().await.active_section;
        let len = match section {
            ActiveSection::Library => self.library.visible().await.len(),
            ActiveSection::Playlist => self.playlist.entries().await.len(),
            ActiveSection::Results => self.search.snapshot().await.results().len(),
            _ => return,
        };
        let last = len.saturating_sub(1);

        let mut state = self.ui_state.lock().await;
        let selected = match section {
            ActiveSection::Library => &mut state.library_selected,
            ActiveSection::Playlist => &mut state.playlist_selected,
            _ => &mut state.results_selected,
        };
        if *selected < last {
            *selected += 1;
        }
    }

    /// Keep cursors inside lists that shrank since the last frame
    async fn clamp_selections(&self, library: usize, playlist: usize, results: usize) {
        let mut state = self.ui_state.lock().await;
        state.library_selected = state.library_selected.min(library.saturating_sub(1));
        state.playlist_selected = state.playlist_selected.min(playlist.saturating_sub(1));
        state.results_selected = state.results_selected.min(results.saturating_sub(1));
    }

    /// Edit the focused text input; returns the new text
    pub async fn append_to_input(&self, c: char) -> Option<(ActiveSection, String)> {
        let mut state = self.ui_state.lock().await;
        match state.active_section {
            ActiveSection::Search => {
                state.search_query.push(c);
                Some((ActiveSection::Search, state.search_query.clone()))
            }
            ActiveSection::Filter => {
                state.filter_query.push(c);
                state.library_selected = 0;
                Some((ActiveSection::Filter, state.filter_query.clone()))
            }
            _ => None,
        }
    }

    pub async fn backspace_input(&self) -> Option<(ActiveSection, String)> {
        let mut state = self.ui_state.lock().await;
        match state.active_section {
            ActiveSection::Search => {
                state.search_query.pop();
                Some((ActiveSection::Search, state.search_query.clone()))
            }
            ActiveSection::Filter => {
                state.filter_query.pop();
                state.library_selected = 0;
                Some((ActiveSection::Filter, state.filter_query.clone()))
            }
            _ => None,
        }
    }

    pub async fn clear_input(&self) -> Option<ActiveSection> {
        let mut state = self.ui_state.lock().await;
        match state.active_section {
            ActiveSection::Search => state.search_query.clear(),
            ActiveSection::Filter => state.filter_query.clear(),
            _ => return None,
        }
        Some(state.active_section)
    }

    pub async fn toggle_theme(&self) -> Theme {
        let mut state = self.ui_state.lock().await;
        state.theme = state.theme.toggle();
        state.theme
    }

    // ========================================================================
    // Notices & errors
    // ========================================================================

    pub async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    #[cfg(test)]
    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn set_notice(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.notice = Some(message);
        state.notice_timestamp = Some(Instant::now());
    }

    pub async fn clear_notice(&self) {
        let mut state = self.ui_state.lock().await;
        state.notice = None;
        state.notice_timestamp = None;
    }

    pub async fn auto_clear_old_messages(&self) {
        let mut state = self.ui_state.lock().await;
        if state.error_timestamp.is_some_and(|t| t.elapsed() > MESSAGE_TTL) {
            state.error_message = None;
            state.error_timestamp = None;
        }
        if state.notice_timestamp.is_some_and(|t| t.elapsed() > MESSAGE_TTL) {
            state.notice = None;
            state.notice_timestamp = None;
        }
    }

    pub async fn show_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = true;
    }

    pub async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Sample the spectrum and snapshot every component for one frame
    pub async fn frame(&self) -> ViewState {
        self.auto_clear_old_messages().await;

        let library = self.library.visible().await;
        let playlist = self.playlist.entries().await;
        let search = self.search.snapshot().await;
        self.clamp_selections(library.len(), playlist.len(), search.results().len())
            .await;

        let ui = self.get_ui_state().await;
        let (spectrum, visualizer_active, visualizer_disabled) = {
            let mut visualizer = self.visualizer.lock().await;
            (
                visualizer.tick(ui.theme),
                visualizer.is_active(),
                visualizer.is_disabled(),
            )
        };

        ViewState {
            playback: self.get_playback_info().await,
            active_playlist_entry: self.playlist.active().await,
            lyrics: self.lyrics.status().await,
            ui,
            library,
            playlist,
            search,
            spectrum,
            visualizer_active,
            visualizer_disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AnalysisTap;
    use crate::model::testing::{model_with, model_with_audio, MockAudio};

    #[tokio::test]
    async fn visible_tracks_are_playlist_then_library() {
        let library = vec![Track::local("music/L.mp3")];
        let model = model_with(library);
        model.playlist.load().await.unwrap();
        model.playlist.add(Track::local("music/P.mp3")).await;

        let names: Vec<String> = model.visible_tracks().await.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["P.mp3", "L.mp3"]);
    }

    #[tokio::test]
    async fn selection_stays_within_list() {
        let model = model_with(vec![Track::local("music/A.mp3"), Track::local("music/B.mp3")]);
        for _ in 0..5 {
            model.move_selection_down().await;
        }
        assert_eq!(model.get_ui_state().await.library_selected, 1);
        model.move_selection_up().await;
        model.move_selection_up().await;
        assert_eq!(model.get_ui_state().await.library_selected, 0);
    }

    #[tokio::test]
    async fn typing_only_edits_text_sections() {
        let model = model_with(Vec::new());
        assert!(model.append_to_input('x').await.is_none());

        model.set_active_section(ActiveSection::Search).await;
        model.append_to_input('a').await;
        let edited = model.append_to_input('b').await;
        assert_eq!(edited, Some((ActiveSection::Search, "ab".to_string())));
        assert_eq!(
            model.backspace_input().await,
            Some((ActiveSection::Search, "a".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn messages_clear_after_five_seconds() {
        let model = model_with(Vec::new());
        model.set_error("boom".into()).await;
        model.set_notice("fyi".into()).await;

        tokio::time::advance(Duration::from_secs(6)).await;
        model.auto_clear_old_messages().await;

        let ui = model.get_ui_state().await;
        assert!(ui.error_message.is_none());
        assert!(ui.notice.is_none());
    }

    #[tokio::test]
    async fn visualizer_without_tap_reports_disabled() {
        let model = model_with(Vec::new());
        model.activate_visualizer().await;
        let frame = model.frame().await;
        assert!(frame.visualizer_disabled);
        assert!(!frame.visualizer_active);
        assert!(frame.spectrum.is_none());
    }

    #[tokio::test]
    async fn activated_visualizer_without_audio_is_active_but_empty() {
        let audio = MockAudio {
            tap: Some(AnalysisTap::new()),
            ..MockAudio::default()
        };
        let model = model_with_audio(Vec::new(), audio);
        assert!(!model.frame().await.visualizer_active);

        model.activate_visualizer().await;
        let frame = model.frame().await;
        assert!(frame.visualizer_active);
        assert!(!frame.visualizer_disabled);
        assert!(frame.spectrum.is_none());
    }
}
