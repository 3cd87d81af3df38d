//! Navigation-related controller methods (library, playlist, search, lyrics)

use tokio::task::JoinHandle;

use crate::model::ActiveSection;
use super::AppController;

pub const PREVIEW_UNAVAILABLE_NOTICE: &str =
    "Preview not available for this track, but you can view lyrics.";

impl AppController {
    /// Feed the search box text to the search pipeline
    pub async fn on_search_input(&self, query: &str) {
        let model = self.model.lock().await;
        let search = model.search.clone();
        model.ui_state.lock().await.results_selected = 0;
        drop(model);
        search.on_input(query).await;
    }

    pub async fn on_filter_input(&self, query: &str) {
        let library = self.model.lock().await.library.clone();
        library.on_filter_input(query).await;
    }

    /// Enter on the focused list
    pub async fn activate_selection(&self) {
        let model = self.model.lock().await;
        let ui_state = model.get_ui_state().await;

        match ui_state.active_section {
            ActiveSection::Library => {
                let track = model.library.get(ui_state.library_selected).await;
                drop(model);
                if let Some(track) = track {
                    self.play_track(track).await;
                }
            }
            ActiveSection::Playlist => {
                let entries = model.playlist.entries().await;
                drop(model);
                if let Some(entry) = entries.into_iter().nth(ui_state.playlist_selected) {
                    self.play_track(entry.track).await;
                }
            }
            ActiveSection::Results => {
                drop(model);
                // The lookup reports through the lyrics status
                let _ = self.select_search_result(ui_state.results_selected).await;
            }
            ActiveSection::Search | ActiveSection::Filter => {}
        }
    }

    /// Previewable results play and load lyrics; others only load lyrics.
    /// Returns the lyrics lookup, or `None` when there is no result at `index`.
    pub async fn select_search_result(&self, index: usize) -> Option<JoinHandle<()>> {
        let model = self.model.lock().await;
        let track = model.search.result_at(index).await?;
        let lyrics = model.lyrics.clone();

        let artist = track.artist.clone().unwrap_or_default();
        tracing::info!(track = %track.name, artist = %artist, preview = track.preview_available, "Search result selected");

        if track.preview_available && track.is_playable() {
            drop(model);
            self.play_track(track.clone()).await;
        } else {
            model.set_notice(PREVIEW_UNAVAILABLE_NOTICE.to_string()).await;
            drop(model);
        }

        Some(lyrics.fetch(&track.name, &artist).await)
    }

    /// `a`: add the selected library track or search result
    pub async fn add_selected_to_playlist(&self) {
        let model = self.model.lock().await;
        let ui_state = model.get_ui_state().await;
        let track = match ui_state.active_section {
            ActiveSection::Library => model.library.get(ui_state.library_selected).await,
            ActiveSection::Results => model.search.result_at(ui_state.results_selected).await,
            _ => None,
        };

        if let Some(track) = track {
            let name = track.name.clone();
            model.playlist.add(track).await;
            model.set_notice(format!("Added \"{}\" to playlist", name)).await;
        }
    }

    /// `d`/Delete: remove the selected playlist entry (first with that identity)
    pub async fn remove_selected_from_playlist(&self) {
        let model = self.model.lock().await;
        let ui_state = model.get_ui_state().await;
        if ui_state.active_section != ActiveSection::Playlist {
            return;
        }

        let entries = model.playlist.entries().await;
        if let Some(entry) = entries.get(ui_state.playlist_selected) {
            // Playback of a removed track carries on
            model.playlist.remove(&entry.track.id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioEvent;
    use crate::controller::tests::controller_with;
    use crate::model::testing::{model_with_failing_saves, model_with_results, remote, MockAudio};
    use crate::model::{LyricsStatus, PlaybackStatus, Track, LYRICS_CONFIG_HINT};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn enter_on_library_plays_selected_track() {
        let (controller, _audio) =
            controller_with(vec![Track::local("music/A.mp3"), Track::local("music/B.mp3")]);
        {
            let model = controller.model.lock().await;
            model.move_selection_down().await;
        }
        controller.activate_selection().await;

        let model = controller.model.lock().await;
        let info = model.get_playback_info().await;
        assert_eq!(info.status, PlaybackStatus::Loading);
        assert_eq!(info.now_playing.title, "B.mp3");
    }

    #[tokio::test]
    async fn add_and_remove_from_playlist() {
        let (controller, _audio) = controller_with(vec![Track::local("music/A.mp3")]);
        {
            let model = controller.model.lock().await;
            model.playlist.load().await.unwrap();
        }

        controller.add_selected_to_playlist().await;
        controller.add_selected_to_playlist().await;
        {
            let model = controller.model.lock().await;
            assert_eq!(model.playlist.entries().await.len(), 2);
            model.set_active_section(ActiveSection::Playlist).await;
        }

        controller.remove_selected_from_playlist().await;
        let model = controller.model.lock().await;
        let entries = model.playlist.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].track.name, "A.mp3");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_saves_keep_local_playlist_without_alert() {
        let model = model_with_failing_saves(vec![Track::local("music/A.mp3")]);
        model.playlist.load().await.unwrap();
        let controller = AppController::new(Arc::new(Mutex::new(model)));

        controller.add_selected_to_playlist().await;
        controller.add_selected_to_playlist().await;
        {
            let model = controller.model.lock().await;
            model.set_active_section(ActiveSection::Playlist).await;
        }
        controller.remove_selected_from_playlist().await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let model = controller.model.lock().await;
        let entries = model.playlist.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].track.name, "A.mp3");
        assert!(model.get_ui_state().await.error_message.is_none());
    }

    #[tokio::test]
    async fn remove_outside_playlist_section_is_ignored() {
        let (controller, _audio) = controller_with(vec![Track::local("music/A.mp3")]);
        {
            let model = controller.model.lock().await;
            model.playlist.load().await.unwrap();
        }
        controller.add_selected_to_playlist().await;
        controller.remove_selected_from_playlist().await;

        let model = controller.model.lock().await;
        assert_eq!(model.playlist.entries().await.len(), 1);
    }

    async fn controller_with_results() -> AppController {
        let mut silent = remote("silent");
        silent.source = None;
        silent.preview_available = false;
        let model = model_with_results(vec![remote("loud"), silent], MockAudio::default());
        model.search.on_input("song").await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        AppController::new(Arc::new(Mutex::new(model)))
    }

    #[tokio::test(start_paused = true)]
    async fn previewable_result_plays_and_fetches_lyrics() {
        let controller = controller_with_results().await;
        let lookup = controller.select_search_result(0).await.unwrap();
        {
            let model = controller.model.lock().await;
            let info = model.get_playback_info().await;
            assert_eq!(info.status, PlaybackStatus::Loading);
            assert_eq!(info.now_playing.title, "loud");
            assert!(model.get_ui_state().await.notice.is_none());
        }

        lookup.await.unwrap();
        let model = controller.model.lock().await;
        assert_eq!(
            model.lyrics.status().await,
            LyricsStatus::Failed {
                message: "No lyrics found".into(),
                hint: LYRICS_CONFIG_HINT,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn lyrics_failure_for_silent_result_leaves_playback_alone() {
        let controller = controller_with_results().await;
        controller.select_search_result(0).await.unwrap().await.unwrap();
        controller
            .handle_audio_event(AudioEvent::CanPlay { generation: 1, duration: None })
            .await;

        let lookup = controller.select_search_result(1).await.unwrap();
        lookup.await.unwrap();

        let model = controller.model.lock().await;
        let info = model.get_playback_info().await;
        assert_eq!(info.status, PlaybackStatus::Playing);
        assert_eq!(info.now_playing.title, "loud");
        assert!(matches!(
            model.lyrics.status().await,
            LyricsStatus::Failed { hint: LYRICS_CONFIG_HINT, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn non_previewable_result_only_fetches_lyrics() {
        let controller = controller_with_results().await;
        controller.select_search_result(1).await.unwrap().await.unwrap();

        let model = controller.model.lock().await;
        assert_eq!(model.get_playback_info().await.status, PlaybackStatus::Idle);
        assert_eq!(
            model.get_ui_state().await.notice.as_deref(),
            Some(PREVIEW_UNAVAILABLE_NOTICE)
        );
        assert!(matches!(model.lyrics.status().await, LyricsStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn selecting_missing_result_does_nothing() {
        let (controller, _audio) = controller_with(Vec::new());
        assert!(controller.select_search_result(3).await.is_none());

        let model = controller.model.lock().await;
        assert_eq!(model.lyrics.status().await, LyricsStatus::Idle);
        assert!(model.get_ui_state().await.notice.is_none());
    }
}
