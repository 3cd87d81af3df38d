//! Spectrum sampling and bar layout
//!
//! `SpectrumSampler` turns the latest tapped samples into 128 byte-sized bin
//! magnitudes, analyser style: Hann window, FFT, temporal smoothing, then a
//! decibel range mapped onto 0..=255.
//!
//! `SpectrumVisualizer` owns the sampler and the drawing surface size and
//! produces draw commands through `render_bars`, which is pure so layout can
//! be tested without a terminal.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::audio::AnalysisTap;
use super::types::{Rgb, Theme};

pub const FFT_SIZE: usize = 256;
pub const BIN_COUNT: usize = FFT_SIZE / 2;

const SMOOTHING: f32 = 0.8;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Bar width relative to an even split of the surface
pub const BAR_SPACING_FACTOR: f32 = 2.5;
/// Horizontal gap between neighbouring bars, in surface units
pub const BAR_GAP: f32 = 2.0;
/// Surface units per terminal cell on both axes
pub const CELL_RESOLUTION: u16 = 8;

pub struct SpectrumSampler {
    tap: AnalysisTap,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl SpectrumSampler {
    pub fn new(tap: AnalysisTap) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let window = (0..FFT_SIZE)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (FFT_SIZE as f32 - 1.0)).cos())
            })
            .collect();

        Self {
            tap,
            fft,
            window,
            smoothed: vec![0.0; BIN_COUNT],
            buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
        }
    }

    /// Bin magnitudes in 0..=255, or `None` when no source feeds the tap
    pub fn sample(&mut self) -> Option<Vec<u8>> {
        let mono = self.tap.snapshot(FFT_SIZE)?;

        // Left-pad with silence when fewer frames than the window are buffered
        let pad = FFT_SIZE - mono.len();
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let value = if i < pad { 0.0 } else { mono[i - pad] };
            *slot = Complex::new(value * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let range = MAX_DECIBELS - MIN_DECIBELS;
        let bins = self
            .buffer
            .iter()
            .take(BIN_COUNT)
            .zip(self.smoothed.iter_mut())
            .map(|(bin, smoothed)| {
                let magnitude = bin.norm() / FFT_SIZE as f32;
                *smoothed = SMOOTHING * *smoothed + (1.0 - SMOOTHING) * magnitude;
                if *smoothed <= 0.0 {
                    return 0;
                }
                let db = 20.0 * smoothed.log10();
                (255.0 * (db - MIN_DECIBELS) / range).clamp(0.0, 255.0) as u8
            })
            .collect();

        Some(bins)
    }
}

/// Drawing surface size in surface units
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

impl Surface {
    /// Surface covering `columns` x `rows` terminal cells
    pub fn from_cells(columns: u16, rows: u16) -> Self {
        Self {
            width: f32::from(columns) * f32::from(CELL_RESOLUTION),
            height: f32::from(rows) * f32::from(CELL_RESOLUTION),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear { width: f32, height: f32 },
    /// Filled bar; `y` is its top edge measured from the top of the surface
    Bar {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        top: Rgb,
        bottom: Rgb,
    },
}

/// Colour of a surface-high gradient from `primary` (top) to `secondary` (bottom)
pub fn gradient_at(primary: Rgb, secondary: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    (
        mix(primary.0, secondary.0),
        mix(primary.1, secondary.1),
        mix(primary.2, secondary.2),
    )
}

/// Lay out one bar per bin, left to right, heights proportional to value/255.
/// Bars that start beyond the surface are dropped, the last one is clipped.
pub fn render_bars(sample: &[u8], surface: Surface, primary: Rgb, secondary: Rgb) -> Vec<DrawCommand> {
    let mut commands = vec![DrawCommand::Clear {
        width: surface.width,
        height: surface.height,
    }];
    if sample.is_empty() || surface.width <= 0.0 || surface.height <= 0.0 {
        return commands;
    }

    let bar_width = surface.width / sample.len() as f32 * BAR_SPACING_FACTOR;
    let drawn_width = (bar_width - BAR_GAP).max(1.0);

    let mut x = 0.0;
    for &value in sample {
        if x >= surface.width {
            break;
        }
        let height = f32::from(value) / 255.0 * surface.height;
        if height > 0.0 {
            let y = surface.height - height;
            commands.push(DrawCommand::Bar {
                x,
                y,
                width: drawn_width.min(surface.width - x),
                height,
                top: gradient_at(primary, secondary, y / surface.height),
                bottom: secondary,
            });
        }
        x += bar_width;
    }

    commands
}

enum Activation {
    /// Waiting for the first user interaction
    Pending,
    Active(SpectrumSampler),
    /// No analysis tap could be built; playback is unaffected
    Disabled,
}

pub struct SpectrumVisualizer {
    activation: Activation,
    surface: Surface,
}

impl SpectrumVisualizer {
    pub fn new() -> Self {
        Self {
            activation: Activation::Pending,
            surface: Surface::default(),
        }
    }

    /// First call decides for the whole session; later calls do nothing
    pub fn activate(&mut self, tap: Option<AnalysisTap>) {
        if !matches!(self.activation, Activation::Pending) {
            return;
        }
        self.activation = match tap {
            Some(tap) => {
                tracing::info!("Spectrum visualizer activated");
                Activation::Active(SpectrumSampler::new(tap))
            }
            None => {
                tracing::warn!("No analysis tap available, visualizer disabled");
                Activation::Disabled
            }
        };
    }

    pub fn is_active(&self) -> bool {
        matches!(self.activation, Activation::Active(_))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.activation, Activation::Disabled)
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.surface = Surface::from_cells(columns, rows);
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Sample and lay out one frame. `None` means skip drawing this frame.
    pub fn tick(&mut self, theme: Theme) -> Option<Vec<DrawCommand>> {
        let Activation::Active(sampler) = &mut self.activation else {
            return None;
        };
        let sample = sampler.sample()?;
        Some(render_bars(&sample, self.surface, theme.primary(), theme.secondary()))
    }
}

impl Default for SpectrumVisualizer {
    fn default() -> Self {
        Self::new()
    }
}
