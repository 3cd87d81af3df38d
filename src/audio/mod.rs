//! Audio adapter - the single playable media endpoint
//!
//! `AudioSource` is the only way to touch the output device. It exposes
//! load / play / pause / seek / volume / loop primitives and reports lifecycle
//! changes as `AudioEvent`s. Every event carries the load generation it belongs
//! to, so a consumer can drop events from a superseded load.
//!
//! - `engine`: rodio-backed implementation on a dedicated thread
//! - `tap`: read-only sample tap used for spectrum analysis

mod engine;
mod tap;

use std::path::PathBuf;
use std::time::Duration;

use crate::error::PlaybackError;

pub use engine::RodioAudioSource;
pub use tap::{AnalysisTap, TappedSource};

pub const DEFAULT_VOLUME: f32 = 1.0;

/// Where a track's audio comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaSource {
    /// File from the local library
    LocalFile(PathBuf),
    /// Opaque preview URL handed out by the search service
    Remote(String),
}

impl MediaSource {
    pub fn reference(&self) -> String {
        match self {
            MediaSource::LocalFile(path) => path.display().to_string(),
            MediaSource::Remote(url) => url.clone(),
        }
    }
}

/// Lifecycle notifications emitted by an `AudioSource`
#[derive(Clone, Debug, PartialEq)]
pub enum AudioEvent {
    LoadStart { generation: u64 },
    CanPlay { generation: u64, duration: Option<Duration> },
    TimeUpdate { generation: u64, position: Duration, duration: Option<Duration> },
    Ended { generation: u64 },
    Error { generation: u64, message: String },
}

impl AudioEvent {
    pub fn generation(&self) -> u64 {
        match self {
            AudioEvent::LoadStart { generation }
            | AudioEvent::CanPlay { generation, .. }
            | AudioEvent::TimeUpdate { generation, .. }
            | AudioEvent::Ended { generation }
            | AudioEvent::Error { generation, .. } => *generation,
        }
    }
}

/// Playback primitives. Calls never block on I/O; results arrive as events.
pub trait AudioSource: Send {
    /// Stop whatever is playing and forget the current source
    fn stop(&mut self);

    /// Begin loading `source`; events for it are tagged with `generation`
    fn load(&mut self, source: &MediaSource, generation: u64);

    /// Start or resume the loaded source. Rejected if nothing is ready.
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    fn seek(&mut self, position: Duration);

    fn set_volume(&mut self, volume: f32);

    fn set_loop(&mut self, enabled: bool);

    /// Read-only analysis tap, if the output graph could be built
    fn tap(&self) -> Option<AnalysisTap>;
}
