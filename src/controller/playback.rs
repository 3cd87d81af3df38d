//! Playback control methods

use crate::error::PlaybackError;
use crate::model::{PlaybackStatus, Track};

use super::AppController;

const SEEK_STEP: f64 = 0.05;
const VOLUME_STEP: f32 = 0.05;

impl AppController {
    /// Start playing `track`, superseding whatever is loading or playing
    pub async fn play_track(&self, track: Track) {
        let model = self.model.lock().await;
        let playback = model.playback.clone();
        let playlist = model.playlist.clone();
        drop(model);

        let id = track.id.clone();
        let result = playback.lock().await.select_track(track);
        match result {
            Ok(_) => playlist.mark_playing(&id).await,
            Err(e) => self.report_playback_error(&e).await,
        }
    }

    pub async fn toggle_playback(&self) {
        let playback = self.model.lock().await.playback.clone();
        let result = playback.lock().await.toggle_play_pause();
        match result {
            Ok(status) => tracing::debug!(?status, "Playback toggled"),
            Err(e) => self.report_playback_error(&e).await,
        }
    }

    pub async fn seek_relative(&self, forward: bool) {
        let playback = self.model.lock().await.playback.clone();
        let delta = if forward { SEEK_STEP } else { -SEEK_STEP };
        if let Some(position) = playback.lock().await.seek_by(delta) {
            tracing::debug!(position, "Seeked");
        }
    }

    pub async fn volume_up(&self) {
        self.change_volume(VOLUME_STEP).await;
    }

    pub async fn volume_down(&self) {
        self.change_volume(-VOLUME_STEP).await;
    }

    async fn change_volume(&self, delta: f32) {
        let playback = self.model.lock().await.playback.clone();
        let mut controller = playback.lock().await;
        let volume = controller.state().volume + delta;
        let level = controller.set_volume(volume);
        tracing::debug!(volume = controller.state().volume, ?level, "Volume changed");
    }

    pub async fn toggle_loop(&self) {
        let playback = self.model.lock().await.playback.clone();
        let enabled = playback.lock().await.toggle_loop();
        tracing::info!(enabled, "Loop toggled");
    }

    /// Turning shuffle on while nothing plays jumps straight to a random track
    pub async fn toggle_shuffle(&self) {
        let model = self.model.lock().await;
        let playback = model.playback.clone();
        let (enabled, idle) = {
            let mut controller = playback.lock().await;
            let enabled = controller.toggle_shuffle();
            (enabled, controller.state().status != PlaybackStatus::Playing)
        };
        tracing::info!(enabled, "Shuffle toggled");

        if !(enabled && idle) {
            return;
        }

        let visible = model.visible_tracks().await;
        drop(model);

        let pick = {
            use rand::seq::IndexedRandom;
            let playable: Vec<&Track> = visible.iter().filter(|t| t.is_playable()).collect();
            playable.choose(&mut rand::rng()).map(|t| (*t).clone())
        };
        if let Some(track) = pick {
            self.play_track(track).await;
        }
    }

    pub(crate) async fn report_playback_error(&self, error: &PlaybackError) {
        tracing::error!(error = %error, "Playback failed");
        let model = self.model.lock().await;
        model.set_error(Self::format_error(error)).await;
    }
}

#[cfg(test)]
mod tests {
    use crate::audio::AudioEvent;
    use crate::controller::tests::controller_with;
    use crate::model::testing::{remote, AudioCall};
    use crate::model::{PlaybackStatus, Track};
    use std::time::Duration;

    #[tokio::test]
    async fn rapid_selection_keeps_only_last_track() {
        let (controller, audio) = controller_with(Vec::new());
        for name in ["one", "two", "three"] {
            controller.play_track(remote(name)).await;
        }

        let model = controller.model.lock().await;
        let mut playback = model.playback.lock().await;
        for generation in 1..=3 {
            playback.handle_event(AudioEvent::CanPlay { generation, duration: None });
        }
        assert_eq!(playback.state().status, PlaybackStatus::Playing);
        assert_eq!(playback.state().current_track.as_ref().unwrap().name, "three");

        let plays = audio.calls().iter().filter(|c| **c == AudioCall::Play).count();
        assert_eq!(plays, 1);
    }

    #[tokio::test]
    async fn unplayable_selection_sets_error() {
        let (controller, _audio) = controller_with(Vec::new());
        let mut track = remote("silent");
        track.source = None;
        controller.play_track(track).await;

        let model = controller.model.lock().await;
        assert!(model.has_error().await);
    }

    #[tokio::test]
    async fn volume_steps_are_clamped() {
        let (controller, audio) = controller_with(Vec::new());
        controller.volume_up().await;
        let model = controller.model.lock().await;
        assert_eq!(model.get_playback_info().await.volume, 1.0);
        drop(model);

        for _ in 0..30 {
            controller.volume_down().await;
        }
        assert_eq!(audio.calls().last(), Some(&AudioCall::Volume(0.0)));
    }

    #[tokio::test]
    async fn seek_step_moves_five_percent() {
        let (controller, audio) = controller_with(Vec::new());
        controller.play_track(remote("one")).await;
        {
            let model = controller.model.lock().await;
            model.playback.lock().await.handle_event(AudioEvent::CanPlay {
                generation: 1,
                duration: Some(Duration::from_secs(200)),
            });
        }

        controller.seek_relative(true).await;
        assert!(audio.calls().contains(&AudioCall::Seek(Duration::from_secs(10))));
    }

    #[tokio::test]
    async fn shuffle_on_while_idle_jumps_to_visible_track() {
        let (controller, _audio) = controller_with(vec![Track::local("music/A.mp3")]);
        controller.toggle_shuffle().await;

        let model = controller.model.lock().await;
        let info = model.get_playback_info().await;
        assert!(info.shuffle_enabled);
        assert_eq!(info.status, PlaybackStatus::Loading);
        assert_eq!(info.current_track.unwrap().name, "A.mp3");
    }
}
