//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that turns key presses into
//! model intents and wires audio adapter events into the playback state machine.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `playback`: Playback control methods
//! - `navigation`: Library/playlist/search/lyrics intents
//! - `player_events`: Audio adapter event listener

mod input;
mod playback;
mod navigation;
mod player_events;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::PlaybackError;
use crate::model::AppModel;

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
}

impl AppController {
    pub fn new(model: Arc<Mutex<AppModel>>) -> Self {
        Self { model }
    }

    pub(crate) fn format_error(error: &PlaybackError) -> String {
        match error {
            PlaybackError::InvalidSource(name) => {
                format!("\"{}\" has no playable audio.", name)
            }
            PlaybackError::Load(_) => {
                "Error playing the audio file. Please try another track.".to_string()
            }
            PlaybackError::PlayRejected(_) => {
                "Playback was blocked. Press Space to start playing.".to_string()
            }
            PlaybackError::EngineUnavailable(_) => {
                "No audio output device available.".to_string()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::testing::{model_with_audio, MockAudio};
    use crate::model::Track;

    pub(crate) fn controller_with(library: Vec<Track>) -> (AppController, MockAudio) {
        let audio = MockAudio::default();
        let model = model_with_audio(library, audio.clone());
        (AppController::new(Arc::new(Mutex::new(model))), audio)
    }

    #[test]
    fn playback_errors_map_to_user_text() {
        let text = AppController::format_error(&PlaybackError::Load("404".into()));
        assert_eq!(text, "Error playing the audio file. Please try another track.");

        let text = AppController::format_error(&PlaybackError::InvalidSource("Song".into()));
        assert!(text.contains("Song"));
    }
}
