use rodio::{ChannelCount, SampleRate, Source};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicU16, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

const TAP_BUFFER_SIZE: usize = 4096;

/// Shared view of the most recent samples sent to the output device.
///
/// Only the engine writes; everyone else gets `snapshot`.
#[derive(Clone)]
pub struct AnalysisTap {
    samples: Arc<Mutex<VecDeque<f32>>>,
    channels: Arc<AtomicU16>,
    connected: Arc<AtomicBool>,
}

impl AnalysisTap {
    pub fn new() -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(TAP_BUFFER_SIZE))),
            channels: Arc::new(AtomicU16::new(2)),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a source is currently feeding the tap
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Last `frames` frames mixed down to mono, oldest first.
    /// Returns `None` when no source is connected.
    pub fn snapshot(&self, frames: usize) -> Option<Vec<f32>> {
        if !self.is_connected() {
            return None;
        }

        let ch = self.channels.load(Ordering::Relaxed).max(1) as usize;
        let samples = self.samples.lock().ok()?;
        let available = samples.len() / ch;
        let take = available.min(frames);
        let start = (available - take) * ch;

        let mut mono = Vec::with_capacity(frames);
        let mut iter = samples.range(start..);
        for _ in 0..take {
            let mut sum = 0.0;
            for _ in 0..ch {
                sum += iter.next().copied().unwrap_or(0.0);
            }
            mono.push(sum / ch as f32);
        }
        Some(mono)
    }

    pub(crate) fn connect(&self, channels: ChannelCount) {
        self.channels.store(channels, Ordering::Relaxed);
        self.clear();
        self.connected.store(true, Ordering::Relaxed);
    }

    pub(crate) fn disconnect(&self) {
        self.connected.store(false, Ordering::Relaxed);
        self.clear();
    }

    fn clear(&self) {
        if let Ok(mut samples) = self.samples.lock() {
            samples.clear();
        }
    }

    fn push(&self, sample: f32) {
        // Never stall the audio callback on a busy reader
        if let Ok(mut samples) = self.samples.try_lock() {
            if samples.len() >= TAP_BUFFER_SIZE {
                samples.pop_front();
            }
            samples.push_back(sample);
        }
    }
}

impl Default for AnalysisTap {
    fn default() -> Self {
        Self::new()
    }
}

/// Source wrapper that copies every sample into an `AnalysisTap`
pub struct TappedSource<I> {
    input: I,
    tap: AnalysisTap,
}

impl<I> TappedSource<I>
where
    I: Source,
{
    pub fn new(input: I, tap: AnalysisTap) -> Self {
        tap.connect(input.channels());
        TappedSource { input, tap }
    }
}

impl<I> Iterator for TappedSource<I>
where
    I: Source,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.input.next()?;
        self.tap.push(sample);
        Some(sample)
    }
}

impl<I> Source for TappedSource<I>
where
    I: Source,
{
    fn current_span_len(&self) -> Option<usize> {
        self.input.current_span_len()
    }

    fn channels(&self) -> ChannelCount {
        self.input.channels()
    }

    fn sample_rate(&self) -> SampleRate {
        self.input.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.input.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), rodio::source::SeekError> {
        self.input.try_seek(pos)
    }
}
