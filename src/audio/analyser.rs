//! Frequency analysis of the played signal.
//!
//! The audio callback pushes every played sample into a [`SampleTap`]; the
//! render loop asks the [`Analyser`] for a byte-scaled [`FrequencySnapshot`]
//! once per frame. The math follows the browser analyser node: Blackman
//! window, forward FFT, magnitude / N, exponential smoothing, dB, then a
//! linear map of [min_dB, max_dB] onto 0..=255.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::params::AnalyserConfig;

/// One frame of byte magnitudes, one per frequency bin
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrequencySnapshot {
    bins: Vec<u8>,
}

impl FrequencySnapshot {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// All-zero snapshot with `bin_count` bins
    pub fn silent(bin_count: usize) -> Self {
        Self {
            bins: vec![0; bin_count],
        }
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Loudest bin (0 when empty)
    pub fn peak(&self) -> u8 {
        self.bins.iter().copied().max().unwrap_or(0)
    }

    /// Mean magnitude across all bins (0 when empty)
    pub fn average(&self) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        self.bins.iter().map(|&b| b as f32).sum::<f32>() / self.bins.len() as f32
    }
}

/// Fixed-size ring holding the most recent samples
#[derive(Debug)]
struct TapRing {
    samples: Vec<f32>,
    write: usize,
}

impl TapRing {
    fn push(&mut self, sample: f32) {
        self.samples[self.write] = sample;
        self.write = (self.write + 1) % self.samples.len();
    }

    /// Copy oldest-to-newest into `out` (same length as the ring)
    fn copy_latest(&self, out: &mut [f32]) {
        let tail = self.samples.len() - self.write;
        out[..tail].copy_from_slice(&self.samples[self.write..]);
        out[tail..].copy_from_slice(&self.samples[..self.write]);
    }
}

/// Shared handle to the most recently played samples (thread-safe)
#[derive(Debug, Clone)]
pub struct SampleTap {
    ring: Arc<Mutex<TapRing>>,
}

impl SampleTap {
    /// Create a tap remembering `capacity` samples (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Arc::new(Mutex::new(TapRing {
                samples: vec![0.0; capacity.max(1)],
                write: 0,
            })),
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().map(|r| r.samples.len()).unwrap_or(0)
    }

    /// Append samples, evicting the oldest ones (one lock per call)
    pub fn push<I>(&self, samples: I)
    where
        I: IntoIterator<Item = f32>,
    {
        if let Ok(mut ring) = self.ring.lock() {
            for sample in samples {
                ring.push(sample);
            }
        }
    }

    /// Forget everything that was played
    pub fn clear(&self) {
        if let Ok(mut ring) = self.ring.lock() {
            ring.samples.fill(0.0);
            ring.write = 0;
        }
    }

    /// Copy the latest samples, oldest first; `out` must match the capacity
    pub(crate) fn copy_latest(&self, out: &mut [f32]) {
        match self.ring.lock() {
            Ok(ring) if ring.samples.len() == out.len() => ring.copy_latest(out),
            _ => out.fill(0.0),
        }
    }
}

/// Frequency-domain analyser fed through a [`SampleTap`]
pub struct Analyser {
    config: AnalyserConfig,
    tap: SampleTap,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    time_domain: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    /// Create an analyser with its own empty tap
    pub fn new(config: AnalyserConfig) -> Result<Self> {
        config.validate()?;

        let size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let window = (0..size).map(|i| blackman_window(i, size)).collect();

        Ok(Self {
            tap: SampleTap::new(size),
            fft,
            window,
            time_domain: vec![0.0; size],
            spectrum: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; config.frequency_bin_count()],
            config,
        })
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    /// Handle for the audio callback
    pub fn tap(&self) -> SampleTap {
        self.tap.clone()
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.config.frequency_bin_count()
    }

    /// Feed samples directly (offline rendering)
    pub fn push_samples(&self, samples: &[f32]) {
        self.tap.push(samples.iter().copied());
    }

    /// Drop the played history and the smoothing state
    pub fn reset(&mut self) {
        self.tap.clear();
        self.smoothed.fill(0.0);
    }

    /// Transform the latest window and fold it into the smoothed magnitudes
    fn update_spectrum(&mut self) {
        let size = self.config.fft_size;
        self.tap.copy_latest(&mut self.time_domain);

        for i in 0..size {
            self.spectrum[i] = Complex::new(self.time_domain[i] * self.window[i], 0.0);
        }
        self.fft.process(&mut self.spectrum);

        let scale = 1.0 / size as f32;
        let tau = self.config.smoothing_time_constant;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(&self.spectrum) {
            let magnitude = bin.norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
            if !smoothed.is_finite() {
                *smoothed = 0.0;
            }
        }
    }

    /// Smoothed magnitudes in decibels, one per bin
    pub fn float_frequency_data(&mut self) -> Vec<f32> {
        self.update_spectrum();
        self.smoothed.iter().map(|&m| linear_to_db(m)).collect()
    }

    /// Byte-scaled smoothed magnitudes, one per bin
    pub fn byte_frequency_data(&mut self) -> FrequencySnapshot {
        self.update_spectrum();

        let min_db = self.config.min_decibels;
        let range = self.config.max_decibels - min_db;
        let bins = self
            .smoothed
            .iter()
            .map(|&m| {
                let scaled = 255.0 / range * (linear_to_db(m) - min_db);
                if scaled.is_nan() {
                    0
                } else {
                    scaled.clamp(0.0, 255.0) as u8
                }
            })
            .collect();

        FrequencySnapshot::new(bins)
    }
}

fn linear_to_db(magnitude: f32) -> f32 {
    20.0 * magnitude.log10()
}

/// Blackman window (a = 0.16) over `size` samples
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}
