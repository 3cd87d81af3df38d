//! Audio adapter event listener

use tokio::sync::mpsc::UnboundedReceiver;

use crate::audio::AudioEvent;
use crate::model::{EndedAction, PlaybackSignal};
use super::AppController;

impl AppController {
    pub fn start_player_event_listener(&self, mut events: UnboundedReceiver<AudioEvent>) {
        let controller = self.clone();
        tracing::info!("Starting audio event listener");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if controller.model.lock().await.should_quit().await {
                    tracing::debug!("Audio event listener shutting down");
                    break;
                }
                controller.handle_audio_event(event).await;
            }
        });
    }

    pub(crate) async fn handle_audio_event(&self, event: AudioEvent) {
        let playback = self.model.lock().await.playback.clone();

        match &event {
            AudioEvent::TimeUpdate { .. } => tracing::trace!(?event, "Audio event"),
            _ => tracing::debug!(?event, "Audio event"),
        }

        let signal = playback.lock().await.handle_event(event);
        match signal {
            None => {}
            Some(PlaybackSignal::Failed(e)) => self.report_playback_error(&e).await,
            Some(PlaybackSignal::Ended) => self.on_track_ended().await,
        }
    }

    async fn on_track_ended(&self) {
        let model = self.model.lock().await;
        let visible = model.visible_tracks().await;
        let playback = model.playback.clone();
        let playlist = model.playlist.clone();
        drop(model);

        let result = {
            let mut controller = playback.lock().await;
            controller.on_ended(&visible, &mut rand::rng())
        };

        match result {
            Ok(EndedAction::Shuffled(track)) => {
                tracing::info!(track = %track.name, "Shuffle advanced");
                playlist.mark_playing(&track.id).await;
            }
            Ok(EndedAction::Looped) => tracing::debug!("Looping current track"),
            Ok(EndedAction::Stopped) => tracing::debug!("Playback ended"),
            Err(e) => self.report_playback_error(&e).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::audio::AudioEvent;
    use crate::controller::tests::controller_with;
    use crate::model::testing::remote;
    use crate::model::{PlaybackStatus, Track};

    #[tokio::test]
    async fn adapter_error_surfaces_to_user() {
        let (controller, _audio) = controller_with(Vec::new());
        controller.play_track(remote("broken")).await;
        controller
            .handle_audio_event(AudioEvent::Error { generation: 1, message: "404".into() })
            .await;

        let model = controller.model.lock().await;
        assert_eq!(model.get_playback_info().await.status, PlaybackStatus::Errored);
        assert!(model.has_error().await);
    }

    #[tokio::test]
    async fn stale_error_is_ignored() {
        let (controller, _audio) = controller_with(Vec::new());
        controller.play_track(remote("one")).await;
        controller.play_track(remote("two")).await;
        controller
            .handle_audio_event(AudioEvent::Error { generation: 1, message: "404".into() })
            .await;

        let model = controller.model.lock().await;
        assert_eq!(model.get_playback_info().await.status, PlaybackStatus::Loading);
        assert!(!model.has_error().await);
    }

    #[tokio::test]
    async fn ended_with_shuffle_moves_to_visible_track() {
        let (controller, _audio) = controller_with(vec![Track::local("music/A.mp3")]);
        controller.play_track(remote("one")).await;
        controller
            .handle_audio_event(AudioEvent::CanPlay { generation: 1, duration: None })
            .await;
        controller.toggle_shuffle().await;

        controller.handle_audio_event(AudioEvent::Ended { generation: 1 }).await;

        let model = controller.model.lock().await;
        let info = model.get_playback_info().await;
        assert_eq!(info.current_track.unwrap().name, "A.mp3");
        assert_eq!(info.status, PlaybackStatus::Loading);
    }

    #[tokio::test]
    async fn ended_without_modes_stops() {
        let (controller, _audio) = controller_with(Vec::new());
        controller.play_track(remote("one")).await;
        controller
            .handle_audio_event(AudioEvent::CanPlay { generation: 1, duration: None })
            .await;
        controller.handle_audio_event(AudioEvent::Ended { generation: 1 }).await;

        let model = controller.model.lock().await;
        assert_eq!(model.get_playback_info().await.status, PlaybackStatus::Ended);
    }
}
