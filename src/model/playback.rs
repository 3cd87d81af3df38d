//! Playback state machine
//!
//! `PlaybackController` owns the single `AudioSource` and the one mutable
//! `PlaybackState`. Everything else reads `PlaybackInfo` snapshots.
//!
//! Transitions:
//!
//! ```text
//! Idle/any --select_track--> Loading --CanPlay+play ok--> Playing
//!                               |      \--play rejected--> Paused
//!                               \--Error--> Errored
//! Playing <--toggle--> Paused
//! Playing --Ended--> (shuffle) Loading | (loop) Playing | Ended
//! ```
//!
//! Each selection bumps a load generation. Adapter events from any other
//! generation are dropped, so a superseded load can never overwrite the
//! state of the latest one.

use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::audio::{AnalysisTap, AudioEvent, AudioSource, DEFAULT_VOLUME};
use crate::error::PlaybackError;
use super::types::{Track, VolumeLevel, DEFAULT_ARTWORK, LOCAL_ARTIST_PLACEHOLDER};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
    Errored,
}

/// "Now playing" display fields, refreshed before a new track starts loading
#[derive(Clone, Debug, PartialEq)]
pub struct NowPlaying {
    pub title: String,
    pub artist: String,
    pub artwork: String,
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self {
            title: "No track playing".to_string(),
            artist: String::new(),
            artwork: DEFAULT_ARTWORK.to_string(),
        }
    }
}

impl NowPlaying {
    pub fn from_track(track: &Track) -> Self {
        let artist = match (&track.artist, track.is_local()) {
            (Some(artist), _) => artist.clone(),
            (None, true) => LOCAL_ARTIST_PLACEHOLDER.to_string(),
            (None, false) => String::new(),
        };

        Self {
            title: track.name.clone(),
            artist,
            artwork: track
                .artwork_url
                .clone()
                .unwrap_or_else(|| DEFAULT_ARTWORK.to_string()),
        }
    }
}

/// The single mutable playback state
#[derive(Clone, Debug)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub status: PlaybackStatus,
    pub position_seconds: f64,
    /// `None` while the duration is unknown
    pub duration_seconds: Option<f64>,
    pub volume: f32,
    pub loop_enabled: bool,
    pub shuffle_enabled: bool,
    pub now_playing: NowPlaying,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_track: None,
            status: PlaybackStatus::Idle,
            position_seconds: 0.0,
            duration_seconds: None,
            volume: DEFAULT_VOLUME,
            loop_enabled: false,
            shuffle_enabled: false,
            now_playing: NowPlaying::default(),
        }
    }
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn volume_level(&self) -> VolumeLevel {
        VolumeLevel::from_volume(self.volume)
    }

    pub fn progress_ratio(&self) -> f64 {
        match self.duration_seconds {
            Some(d) if d > 0.0 => (self.position_seconds / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Read-only snapshot for rendering
pub type PlaybackInfo = PlaybackState;

/// What the orchestrating code has to do after an adapter event
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackSignal {
    /// The current track finished; call `on_ended` with the visible tracks
    Ended,
    /// A user-visible failure
    Failed(PlaybackError),
}

/// Outcome of `on_ended`
#[derive(Clone, Debug, PartialEq)]
pub enum EndedAction {
    Shuffled(Track),
    Looped,
    Stopped,
}

pub struct PlaybackController {
    audio: Box<dyn AudioSource>,
    state: PlaybackState,
    generation: u64,
}

impl PlaybackController {
    pub fn new(audio: Box<dyn AudioSource>) -> Self {
        Self {
            audio,
            state: PlaybackState::default(),
            generation: 0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn snapshot(&self) -> PlaybackInfo {
        self.state.clone()
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn analysis_tap(&self) -> Option<AnalysisTap> {
        self.audio.tap()
    }

    /// Start loading `track`. Returns `Ok(false)` when the request collapses
    /// into the load or playback already in progress for the same track.
    pub fn select_track(&mut self, track: Track) -> Result<bool, PlaybackError> {
        let Some(source) = track.source.clone().filter(|_| track.is_playable()) else {
            return Err(PlaybackError::InvalidSource(track.name.clone()));
        };

        let same_track = self.state.current_track.as_ref().map(|t| t.id == track.id).unwrap_or(false);
        if same_track
            && matches!(self.state.status, PlaybackStatus::Loading | PlaybackStatus::Playing)
        {
            tracing::debug!(track = %track.name, "Selection collapsed into current load");
            return Ok(false);
        }

        self.generation += 1;
        tracing::info!(track = %track.name, generation = self.generation, "Selecting track");

        // Display fields first so the UI never shows the previous track mid-transition
        self.state.now_playing = NowPlaying::from_track(&track);
        self.state.current_track = Some(track);
        self.state.status = PlaybackStatus::Loading;
        self.state.position_seconds = 0.0;
        self.state.duration_seconds = None;

        self.audio.stop();
        self.audio.load(&source, self.generation);
        Ok(true)
    }

    /// Apply an adapter event. Events from superseded loads are ignored.
    pub fn handle_event(&mut self, event: AudioEvent) -> Option<PlaybackSignal> {
        if event.generation() != self.generation {
            tracing::trace!(
                event_generation = event.generation(),
                current = self.generation,
                "Dropping stale audio event"
            );
            return None;
        }

        match event {
            AudioEvent::LoadStart { .. } => {
                tracing::debug!("Audio started loading");
                None
            }
            AudioEvent::CanPlay { duration, .. } => {
                if let Some(d) = duration {
                    self.state.duration_seconds = Some(d.as_secs_f64());
                }
                if self.state.status != PlaybackStatus::Loading {
                    return None;
                }
                match self.audio.play() {
                    Ok(()) => {
                        self.state.status = PlaybackStatus::Playing;
                        None
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Play request rejected");
                        self.state.status = PlaybackStatus::Paused;
                        Some(PlaybackSignal::Failed(e))
                    }
                }
            }
            AudioEvent::TimeUpdate { position, duration, .. } => {
                self.state.position_seconds = position.as_secs_f64();
                if let Some(d) = duration {
                    self.state.duration_seconds = Some(d.as_secs_f64());
                }
                None
            }
            AudioEvent::Ended { .. } => {
                if let Some(d) = self.state.duration_seconds {
                    self.state.position_seconds = d;
                }
                Some(PlaybackSignal::Ended)
            }
            AudioEvent::Error { message, .. } => {
                tracing::error!(error = %message, "Audio playback error");
                self.state.status = PlaybackStatus::Errored;
                Some(PlaybackSignal::Failed(PlaybackError::Load(message)))
            }
        }
    }

    /// Playing <-> Paused. Any other state is left alone.
    pub fn toggle_play_pause(&mut self) -> Result<PlaybackStatus, PlaybackError> {
        match self.state.status {
            PlaybackStatus::Playing => {
                self.audio.pause();
                self.state.status = PlaybackStatus::Paused;
            }
            PlaybackStatus::Paused => {
                if let Err(e) = self.audio.play() {
                    self.state.status = PlaybackStatus::Paused;
                    return Err(e);
                }
                self.state.status = PlaybackStatus::Playing;
            }
            other => {
                tracing::debug!(status = ?other, "Play/pause ignored in this state");
            }
        }
        Ok(self.state.status)
    }

    /// Jump to `fraction` of the duration. No-op while the duration is unknown.
    pub fn seek(&mut self, fraction: f64) -> Option<f64> {
        if !fraction.is_finite() {
            return None;
        }
        let duration = self.state.duration_seconds.filter(|d| d.is_finite())?;
        let position = fraction.clamp(0.0, 1.0) * duration;

        self.state.position_seconds = position;
        self.audio.seek(Duration::from_secs_f64(position));
        Some(position)
    }

    /// Move relative to the current position by a fraction of the duration
    pub fn seek_by(&mut self, delta_fraction: f64) -> Option<f64> {
        let duration = self.state.duration_seconds.filter(|d| *d > 0.0)?;
        let current = self.state.position_seconds / duration;
        self.seek(current + delta_fraction)
    }

    pub fn set_volume(&mut self, volume: f32) -> VolumeLevel {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.state.volume = volume;
        self.audio.set_volume(volume);
        VolumeLevel::from_volume(volume)
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.state.loop_enabled = !self.state.loop_enabled;
        self.audio.set_loop(self.state.loop_enabled);
        self.state.loop_enabled
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.state.shuffle_enabled = !self.state.shuffle_enabled;
        self.state.shuffle_enabled
    }

    /// Decide what follows a finished track
    pub fn on_ended<R: Rng + ?Sized>(
        &mut self,
        visible: &[Track],
        rng: &mut R,
    ) -> Result<EndedAction, PlaybackError> {
        if self.state.shuffle_enabled {
            let candidates: Vec<&Track> = visible.iter().filter(|t| t.is_playable()).collect();
            if let Some(next) = candidates.choose(rng) {
                let next = (*next).clone();
                tracing::info!(track = %next.name, "Shuffle picked next track");
                // The finished track may be picked again; force a fresh load
                self.state.status = PlaybackStatus::Ended;
                self.select_track(next.clone())?;
                return Ok(EndedAction::Shuffled(next));
            }
        }

        if self.state.loop_enabled {
            self.state.position_seconds = 0.0;
            self.audio.seek(Duration::ZERO);
            return match self.audio.play() {
                Ok(()) => {
                    self.state.status = PlaybackStatus::Playing;
                    Ok(EndedAction::Looped)
                }
                Err(e) => {
                    self.state.status = PlaybackStatus::Paused;
                    Err(e)
                }
            };
        }

        self.state.status = PlaybackStatus::Ended;
        Ok(EndedAction::Stopped)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::audio::MediaSource;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum AudioCall {
        Stop,
        Load(String, u64),
        Play,
        Pause,
        Seek(Duration),
        Volume(f32),
        Loop(bool),
    }

    /// Records every adapter call; `play` can be made to fail
    #[derive(Clone, Default)]
    pub(crate) struct MockAudio {
        pub calls: Arc<Mutex<Vec<AudioCall>>>,
        pub reject_play: Arc<Mutex<bool>>,
        pub tap: Option<AnalysisTap>,
    }

    impl MockAudio {
        pub fn calls(&self) -> Vec<AudioCall> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: AudioCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl AudioSource for MockAudio {
        fn stop(&mut self) {
            self.record(AudioCall::Stop);
        }

        fn load(&mut self, source: &MediaSource, generation: u64) {
            self.record(AudioCall::Load(source.reference(), generation));
        }

        fn play(&mut self) -> Result<(), PlaybackError> {
            if *self.reject_play.lock().unwrap() {
                return Err(PlaybackError::PlayRejected("autoplay blocked".to_string()));
            }
            self.record(AudioCall::Play);
            Ok(())
        }

        fn pause(&mut self) {
            self.record(AudioCall::Pause);
        }

        fn seek(&mut self, position: Duration) {
            self.record(AudioCall::Seek(position));
        }

        fn set_volume(&mut self, volume: f32) {
            self.record(AudioCall::Volume(volume));
        }

        fn set_loop(&mut self, enabled: bool) {
            self.record(AudioCall::Loop(enabled));
        }

        fn tap(&self) -> Option<AnalysisTap> {
            self.tap.clone()
        }
    }

    pub(crate) fn remote(name: &str) -> Track {
        Track {
            id: format!("https://previews.example/{name}"),
            name: name.to_string(),
            artist: Some("Artist".to_string()),
            artwork_url: None,
            preview_available: true,
            source: Some(MediaSource::Remote(format!("https://previews.example/{name}"))),
        }
    }

    fn controller() -> (PlaybackController, MockAudio) {
        let audio = MockAudio::default();
        (PlaybackController::new(Box::new(audio.clone())), audio)
    }

    fn playing(name: &str) -> (PlaybackController, MockAudio) {
        let (mut c, audio) = controller();
        c.select_track(remote(name)).unwrap();
        let generation = c.generation();
        c.handle_event(AudioEvent::CanPlay {
            generation,
            duration: Some(Duration::from_secs(200)),
        });
        (c, audio)
    }

    #[test]
    fn latest_selection_wins_over_stale_loads() {
        let (mut c, _audio) = controller();
        c.select_track(remote("one")).unwrap();
        let first = c.generation();
        c.select_track(remote("two")).unwrap();
        let second = c.generation();
        c.select_track(remote("three")).unwrap();
        let third = c.generation();

        // Old loads complete late and out of order
        assert_eq!(c.handle_event(AudioEvent::CanPlay { generation: second, duration: None }), None);
        assert_eq!(
            c.handle_event(AudioEvent::Error { generation: first, message: "404".into() }),
            None
        );
        assert_eq!(c.state().status, PlaybackStatus::Loading);
        assert_eq!(c.state().current_track.as_ref().unwrap().name, "three");

        c.handle_event(AudioEvent::CanPlay { generation: third, duration: None });
        assert_eq!(c.state().status, PlaybackStatus::Playing);
        assert_eq!(c.state().current_track.as_ref().unwrap().name, "three");
    }

    #[test]
    fn reselecting_the_loading_track_is_a_no_op() {
        let (mut c, audio) = controller();
        assert!(c.select_track(remote("one")).unwrap());
        assert!(!c.select_track(remote("one")).unwrap());
        assert_eq!(c.generation(), 1);

        let loads = audio
            .calls()
            .into_iter()
            .filter(|call| matches!(call, AudioCall::Load(..)))
            .count();
        assert_eq!(loads, 1);
    }

    #[test]
    fn selection_updates_display_before_loading() {
        let (mut c, audio) = controller();
        c.select_track(Track::local("music/A.mp3")).unwrap();

        assert_eq!(c.state().now_playing.title, "A.mp3");
        assert_eq!(c.state().now_playing.artist, LOCAL_ARTIST_PLACEHOLDER);
        assert_eq!(c.state().now_playing.artwork, DEFAULT_ARTWORK);
        assert_eq!(audio.calls()[0], AudioCall::Stop);
        assert!(matches!(audio.calls()[1], AudioCall::Load(_, 1)));
    }

    #[test]
    fn unplayable_track_is_rejected() {
        let (mut c, _audio) = controller();
        let mut track = remote("silent");
        track.source = None;
        assert!(matches!(c.select_track(track), Err(PlaybackError::InvalidSource(_))));
        assert_eq!(c.state().status, PlaybackStatus::Idle);
    }

    #[test]
    fn adapter_error_moves_to_errored() {
        let (mut c, _audio) = controller();
        c.select_track(remote("broken")).unwrap();
        let signal = c.handle_event(AudioEvent::Error { generation: 1, message: "decode".into() });
        assert!(matches!(signal, Some(PlaybackSignal::Failed(PlaybackError::Load(_)))));
        assert_eq!(c.state().status, PlaybackStatus::Errored);
    }

    #[test]
    fn rejected_autoplay_reverts_to_paused() {
        let (mut c, audio) = controller();
        *audio.reject_play.lock().unwrap() = true;
        c.select_track(remote("one")).unwrap();
        let signal = c.handle_event(AudioEvent::CanPlay { generation: 1, duration: None });
        assert!(matches!(signal, Some(PlaybackSignal::Failed(PlaybackError::PlayRejected(_)))));
        assert_eq!(c.state().status, PlaybackStatus::Paused);
    }

    #[test]
    fn toggle_is_symmetric_and_reports_rejection() {
        let (mut c, audio) = playing("one");
        assert_eq!(c.toggle_play_pause().unwrap(), PlaybackStatus::Paused);
        assert_eq!(c.toggle_play_pause().unwrap(), PlaybackStatus::Playing);

        c.toggle_play_pause().unwrap();
        *audio.reject_play.lock().unwrap() = true;
        assert!(c.toggle_play_pause().is_err());
        assert_eq!(c.state().status, PlaybackStatus::Paused);
    }

    #[test]
    fn toggle_outside_playing_or_paused_does_nothing() {
        let (mut c, audio) = controller();
        assert_eq!(c.toggle_play_pause().unwrap(), PlaybackStatus::Idle);
        assert!(audio.calls().is_empty());
    }

    #[test]
    fn seek_uses_fraction_of_known_duration() {
        let (mut c, audio) = playing("one");
        assert_eq!(c.seek(0.5), Some(100.0));
        assert!(audio.calls().contains(&AudioCall::Seek(Duration::from_secs(100))));
    }

    #[test]
    fn seek_ignores_non_finite_fractions() {
        let (mut c, audio) = playing("one");
        assert_eq!(c.seek(f64::NAN), None);
        assert_eq!(c.seek(f64::INFINITY), None);
        assert!(!audio.calls().iter().any(|call| matches!(call, AudioCall::Seek(_))));
        assert_eq!(c.snapshot().position_seconds, 0.0);
    }

    #[test]
    fn seek_without_duration_is_a_no_op() {
        let (mut c, audio) = controller();
        c.select_track(remote("one")).unwrap();
        assert_eq!(c.seek(0.5), None);
        assert!(!audio.calls().iter().any(|call| matches!(call, AudioCall::Seek(_))));
    }

    #[test]
    fn volume_is_clamped_and_mapped_to_levels() {
        let (mut c, audio) = controller();
        assert_eq!(c.set_volume(0.0), VolumeLevel::Muted);
        assert_eq!(c.set_volume(0.3), VolumeLevel::Low);
        assert_eq!(c.set_volume(0.7), VolumeLevel::Full);
        assert_eq!(c.set_volume(1.8), VolumeLevel::Full);
        assert_eq!(c.state().volume, 1.0);
        assert_eq!(c.set_volume(-2.0), VolumeLevel::Muted);
        assert_eq!(audio.calls().last(), Some(&AudioCall::Volume(0.0)));
    }

    #[test]
    fn ended_without_modes_stops() {
        let (mut c, _audio) = playing("one");
        let signal = c.handle_event(AudioEvent::Ended { generation: 1 });
        assert_eq!(signal, Some(PlaybackSignal::Ended));

        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(c.on_ended(&[], &mut rng).unwrap(), EndedAction::Stopped);
        assert_eq!(c.state().status, PlaybackStatus::Ended);
    }

    #[test]
    fn ended_with_loop_restarts_same_track() {
        let (mut c, audio) = playing("one");
        c.toggle_loop();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(c.on_ended(&[], &mut rng).unwrap(), EndedAction::Looped);
        assert_eq!(c.state().status, PlaybackStatus::Playing);
        assert_eq!(c.state().current_track.as_ref().unwrap().name, "one");
        assert!(audio.calls().contains(&AudioCall::Seek(Duration::ZERO)));
    }

    #[test]
    fn ended_with_shuffle_picks_from_visible_set() {
        let (mut c, _audio) = playing("one");
        c.toggle_shuffle();
        c.toggle_loop();
        let visible = vec![remote("a"), remote("b"), remote("c")];
        let mut rng = StdRng::seed_from_u64(42);

        match c.on_ended(&visible, &mut rng).unwrap() {
            EndedAction::Shuffled(track) => {
                assert!(visible.contains(&track));
                assert_eq!(c.state().current_track.as_ref(), Some(&track));
                assert_eq!(c.state().status, PlaybackStatus::Loading);
            }
            other => panic!("expected shuffle, got {other:?}"),
        }
    }

    #[test]
    fn time_updates_track_position_and_duration() {
        let (mut c, _audio) = controller();
        c.select_track(remote("one")).unwrap();
        c.handle_event(AudioEvent::TimeUpdate {
            generation: 1,
            position: Duration::from_secs(30),
            duration: Some(Duration::from_secs(120)),
        });
        assert_eq!(c.state().position_seconds, 30.0);
        assert_eq!(c.state().duration_seconds, Some(120.0));
        assert_eq!(c.state().progress_ratio(), 0.25);
    }
}
