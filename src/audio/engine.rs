//! rodio audio engine
//!
//! The output stream lives on its own thread and is driven by a command channel.
//! Fetching bytes (file or HTTP) happens on the tokio runtime; decoding and
//! playback happen on the engine thread.

use std::{
    io::Cursor,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tokio::sync::mpsc::UnboundedSender;

use super::{AnalysisTap, AudioEvent, AudioSource, MediaSource, TappedSource, DEFAULT_VOLUME};
use crate::error::PlaybackError;

const ENGINE_TICK: Duration = Duration::from_millis(16);
const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

enum EngineCommand {
    Stop,
    Loaded { generation: u64, bytes: Arc<[u8]> },
    Play,
    Pause,
    Seek(Duration),
    SetVolume(f32),
    SetLoop(bool),
}

/// `AudioSource` backed by a rodio output stream
pub struct RodioAudioSource {
    commands: Sender<EngineCommand>,
    events: UnboundedSender<AudioEvent>,
    runtime: tokio::runtime::Handle,
    http: reqwest::Client,
    latest_generation: Arc<AtomicU64>,
    ready: Arc<AtomicBool>,
    tap: Option<AnalysisTap>,
    unavailable: Option<String>,
}

impl RodioAudioSource {
    /// Spawn the engine thread. Must be called from within a tokio runtime.
    ///
    /// If no output device can be opened the adapter is still returned, but
    /// every load fails and no analysis tap is offered.
    pub fn new(events: UnboundedSender<AudioEvent>, http: reqwest::Client) -> Self {
        let (commands, receiver) = mpsc::channel();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), String>>();
        let tap = AnalysisTap::new();
        let ready = Arc::new(AtomicBool::new(false));
        let latest_generation = Arc::new(AtomicU64::new(0));

        let engine_tap = tap.clone();
        let engine_events = events.clone();
        let engine_ready = Arc::clone(&ready);
        let engine_latest = Arc::clone(&latest_generation);

        let spawned = thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = init_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                // The drop notice would land on the alternate screen
                stream.log_on_drop(false);
                let _ = init_tx.send(Ok(()));

                let mut engine = Engine::new(
                    stream,
                    engine_tap,
                    engine_events,
                    engine_ready,
                    engine_latest,
                );
                engine.run(receiver);
            });

        let unavailable = match spawned {
            Ok(_) => match init_rx.recv() {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(_) => Some("audio engine exited during startup".to_string()),
            },
            Err(e) => Some(e.to_string()),
        };

        match &unavailable {
            None => tracing::info!("Audio engine started"),
            Some(reason) => tracing::error!(reason = %reason, "Audio output unavailable"),
        }

        Self {
            commands,
            events,
            runtime: tokio::runtime::Handle::current(),
            http,
            latest_generation,
            ready,
            tap: if unavailable.is_none() { Some(tap) } else { None },
            unavailable,
        }
    }

    fn send(&self, command: EngineCommand) -> Result<(), PlaybackError> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::EngineUnavailable("audio engine stopped".to_string()))
    }
}

impl AudioSource for RodioAudioSource {
    fn stop(&mut self) {
        self.ready.store(false, Ordering::SeqCst);
        let _ = self.send(EngineCommand::Stop);
    }

    fn load(&mut self, source: &MediaSource, generation: u64) {
        self.latest_generation.store(generation, Ordering::SeqCst);
        self.ready.store(false, Ordering::SeqCst);
        let _ = self.events.send(AudioEvent::LoadStart { generation });

        if let Some(reason) = &self.unavailable {
            let _ = self.events.send(AudioEvent::Error {
                generation,
                message: reason.clone(),
            });
            return;
        }

        tracing::debug!(generation, source = %source.reference(), "Loading audio source");

        let source = source.clone();
        let http = self.http.clone();
        let events = self.events.clone();
        let commands = self.commands.clone();
        let latest = Arc::clone(&self.latest_generation);

        self.runtime.spawn(async move {
            let fetched = fetch_bytes(&http, &source).await;

            // A newer load owns the engine now
            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!(generation, "Discarding superseded audio fetch");
                return;
            }

            match fetched {
                Ok(bytes) => {
                    let _ = commands.send(EngineCommand::Loaded { generation, bytes });
                }
                Err(message) => {
                    tracing::warn!(generation, error = %message, "Audio fetch failed");
                    let _ = events.send(AudioEvent::Error { generation, message });
                }
            }
        });
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if let Some(reason) = &self.unavailable {
            return Err(PlaybackError::EngineUnavailable(reason.clone()));
        }
        if !self.ready.load(Ordering::SeqCst) {
            return Err(PlaybackError::PlayRejected("no audio source is ready".to_string()));
        }
        self.send(EngineCommand::Play)
    }

    fn pause(&mut self) {
        let _ = self.send(EngineCommand::Pause);
    }

    fn seek(&mut self, position: Duration) {
        let _ = self.send(EngineCommand::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        let _ = self.send(EngineCommand::SetVolume(volume));
    }

    fn set_loop(&mut self, enabled: bool) {
        let _ = self.send(EngineCommand::SetLoop(enabled));
    }

    fn tap(&self) -> Option<AnalysisTap> {
        self.tap.clone()
    }
}

async fn fetch_bytes(http: &reqwest::Client, source: &MediaSource) -> Result<Arc<[u8]>, String> {
    match source {
        MediaSource::LocalFile(path) => tokio::fs::read(path)
            .await
            .map(Arc::from)
            .map_err(|e| format!("{}: {}", path.display(), e)),
        MediaSource::Remote(url) => {
            let response = http
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| e.to_string())?;
            let bytes = response.bytes().await.map_err(|e| e.to_string())?;
            Ok(Arc::from(bytes.as_ref()))
        }
    }
}

struct Engine {
    stream: OutputStream,
    sink: Option<Sink>,
    tap: AnalysisTap,
    events: UnboundedSender<AudioEvent>,
    ready: Arc<AtomicBool>,
    latest_generation: Arc<AtomicU64>,
    generation: u64,
    bytes: Option<Arc<[u8]>>,
    duration: Option<Duration>,
    volume: f32,
    looping: bool,
    playing: bool,
    last_time_update: Instant,
}

impl Engine {
    fn new(
        stream: OutputStream,
        tap: AnalysisTap,
        events: UnboundedSender<AudioEvent>,
        ready: Arc<AtomicBool>,
        latest_generation: Arc<AtomicU64>,
    ) -> Self {
        Self {
            stream,
            sink: None,
            tap,
            events,
            ready,
            latest_generation,
            generation: 0,
            bytes: None,
            duration: None,
            volume: DEFAULT_VOLUME,
            looping: false,
            playing: false,
            last_time_update: Instant::now(),
        }
    }

    fn run(&mut self, receiver: Receiver<EngineCommand>) {
        loop {
            match receiver.recv_timeout(ENGINE_TICK) {
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!("Audio engine shutting down");
                    self.stop();
                    return;
                }
            }
            self.tick();
        }
    }

    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Stop => self.stop(),
            EngineCommand::Loaded { generation, bytes } => self.install(generation, bytes),
            EngineCommand::Play => {
                if let Some(sink) = &self.sink {
                    sink.play();
                    self.playing = true;
                }
            }
            EngineCommand::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                }
                self.playing = false;
            }
            EngineCommand::Seek(position) => self.seek(position),
            EngineCommand::SetVolume(volume) => {
                self.volume = volume;
                if let Some(sink) = &self.sink {
                    sink.set_volume(volume);
                }
            }
            EngineCommand::SetLoop(enabled) => self.looping = enabled,
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.bytes = None;
        self.duration = None;
        self.playing = false;
        self.tap.disconnect();
    }

    fn install(&mut self, generation: u64, bytes: Arc<[u8]>) {
        if self.latest_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "Ignoring stale decoded source");
            return;
        }

        self.stop();
        self.generation = generation;

        match self.build_sink(&bytes) {
            Ok(duration) => {
                self.bytes = Some(bytes);
                self.duration = duration;
                self.ready.store(true, Ordering::SeqCst);
                let _ = self.events.send(AudioEvent::CanPlay { generation, duration });
            }
            Err(message) => {
                tracing::warn!(generation, error = %message, "Audio decode failed");
                let _ = self.events.send(AudioEvent::Error { generation, message });
            }
        }
    }

    /// Decode `bytes` into a fresh paused sink
    fn build_sink(&mut self, bytes: &Arc<[u8]>) -> Result<Option<Duration>, String> {
        let decoder = Decoder::new(Cursor::new(Arc::clone(bytes))).map_err(|e| e.to_string())?;
        let duration = decoder.total_duration();

        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(TappedSource::new(decoder, self.tap.clone()));
        self.sink = Some(sink);

        Ok(duration)
    }

    fn rebuild(&mut self) -> bool {
        let Some(bytes) = self.bytes.clone() else {
            return false;
        };
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        match self.build_sink(&bytes) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to rebuild audio source");
                false
            }
        }
    }

    fn seek(&mut self, position: Duration) {
        let finished = self.sink.as_ref().map(|s| s.empty()).unwrap_or(true);
        if finished && !self.rebuild() {
            return;
        }

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.try_seek(position) {
                tracing::warn!(error = %e, position_ms = position.as_millis() as u64, "Seek failed");
            }
            if self.playing {
                sink.play();
            }
        }
        self.emit_time_update();
    }

    fn tick(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };

        if self.playing && sink.empty() {
            if self.looping && self.rebuild() {
                if let Some(sink) = &self.sink {
                    sink.play();
                }
                return;
            }

            self.playing = false;
            self.tap.disconnect();
            let _ = self.events.send(AudioEvent::Ended { generation: self.generation });
            return;
        }

        if self.playing && self.last_time_update.elapsed() >= TIME_UPDATE_INTERVAL {
            self.emit_time_update();
        }
    }

    fn emit_time_update(&mut self) {
        self.last_time_update = Instant::now();
        let position = self.sink.as_ref().map(|s| s.get_pos()).unwrap_or_default();
        let _ = self.events.send(AudioEvent::TimeUpdate {
            generation: self.generation,
            position,
            duration: self.duration,
        });
    }
}
