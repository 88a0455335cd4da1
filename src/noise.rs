//! Noise buffer synthesis (white, pink and brown).
//!
//! Every call produces an independent buffer: filter state starts at zero
//! and is dropped when the call returns, so consecutive buffers are not a
//! continuous stream.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{NoiseFieldError, Result};

/// Spectral color of the generated noise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseType {
    /// Equal energy per frequency
    #[default]
    White,
    /// ~1/f, cascaded one-pole filters
    Pink,
    /// ~1/f², leaky integrator
    Brown,
}

impl NoiseType {
    pub const ALL: [NoiseType; 3] = [NoiseType::White, NoiseType::Pink, NoiseType::Brown];

    pub fn name(&self) -> &'static str {
        match self {
            NoiseType::White => "white",
            NoiseType::Pink => "pink",
            NoiseType::Brown => "brown",
        }
    }
}

impl fmt::Display for NoiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoiseType {
    type Err = NoiseFieldError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "white" => Ok(NoiseType::White),
            "pink" => Ok(NoiseType::Pink),
            "brown" | "brownian" | "red" => Ok(NoiseType::Brown),
            other => Err(NoiseFieldError::invalid(
                "noise type",
                format!("expected white, pink or brown, got '{}'", other),
            )),
        }
    }
}

/// Parameters consumed once per buffer generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParameters {
    pub kind: NoiseType,

    /// Horizontal pointer bias in [0, 1] (1 silences the output)
    pub x_bias: f32,

    /// Vertical pointer bias in [0, 1] (1 silences the output)
    pub y_bias: f32,
}

impl NoiseParameters {
    /// Build validated parameters
    pub fn new(kind: NoiseType, x_bias: f32, y_bias: f32) -> Result<Self> {
        Ok(Self {
            kind,
            x_bias: check_bias("x_bias", x_bias)?,
            y_bias: check_bias("y_bias", y_bias)?,
        })
    }

    /// Amplitude multiplier applied to every white draw
    pub fn attenuation(&self) -> f32 {
        (1.0 - self.x_bias) * (1.0 - self.y_bias)
    }
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            kind: NoiseType::White,
            x_bias: 0.5,
            y_bias: 0.5,
        }
    }
}

fn check_bias(name: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(NoiseFieldError::invalid(
            name,
            format!("must be in [0, 1], got {}", value),
        ))
    }
}

/// Immutable block of mono samples at a fixed sample rate.
///
/// Cloning is cheap: the samples are shared with the audio callback.
#[derive(Debug, Clone)]
pub struct NoiseBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl NoiseBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback length in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0, |acc, s| acc.max(s.abs()))
    }

    /// Write the buffer as a mono 32-bit float WAV file
    pub fn write_wav(&self, path: impl AsRef<Path>) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in self.samples.iter() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

/// Number of samples for `seconds` of audio at `sample_rate`
pub fn buffer_len(sample_rate: u32, seconds: f32) -> usize {
    (sample_rate as f32 * seconds).round() as usize
}

/// Pink noise filter bank (six leaky poles plus a direct term)
#[derive(Debug, Default)]
struct PinkFilter {
    b: [f32; 6],
}

impl PinkFilter {
    fn process(&mut self, white: f32) -> f32 {
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + white * 0.0555179;
        b[1] = 0.99332 * b[1] + white * 0.0750759;
        b[2] = 0.96900 * b[2] + white * 0.1538520;
        b[3] = 0.86650 * b[3] + white * 0.3104856;
        b[4] = 0.55000 * b[4] + white * 0.5329522;
        b[5] = -0.7616 * b[5] - white * 0.0168980;
        let b6 = white * 0.115926;
        (b.iter().sum::<f32>() + b6 + white * 0.5362) * 0.11
    }
}

/// Brown noise leaky integrator
#[derive(Debug, Default)]
struct BrownFilter {
    last: f32,
}

impl BrownFilter {
    fn process(&mut self, white: f32) -> f32 {
        self.last = (self.last + 0.02 * white) / 1.02;
        self.last * 3.5
    }
}

/// Synthesize `buffer_size` samples from a white source.
///
/// `white` must yield raw draws in [-1, 1]; the bias attenuation is applied
/// here, before any filtering.
pub fn generate_samples<F>(
    params: &NoiseParameters,
    buffer_size: usize,
    mut white: F,
) -> Result<Vec<f32>>
where
    F: FnMut() -> f32,
{
    if buffer_size == 0 {
        return Err(NoiseFieldError::invalid("buffer_size", "must be > 0"));
    }
    // Re-check in case the fields were set directly
    check_bias("x_bias", params.x_bias)?;
    check_bias("y_bias", params.y_bias)?;

    let gain = params.attenuation();
    let mut next = move || white() * gain;

    let samples = match params.kind {
        NoiseType::White => (0..buffer_size).map(|_| next()).collect(),
        NoiseType::Pink => {
            let mut filter = PinkFilter::default();
            (0..buffer_size).map(|_| filter.process(next())).collect()
        }
        NoiseType::Brown => {
            let mut filter = BrownFilter::default();
            (0..buffer_size).map(|_| filter.process(next())).collect()
        }
    };

    Ok(samples)
}

/// Synthesize a buffer at `sample_rate` using `rng` as the white source
pub fn generate<R: Rng>(
    kind: NoiseType,
    buffer_size: usize,
    x_bias: f32,
    y_bias: f32,
    sample_rate: u32,
    rng: &mut R,
) -> Result<NoiseBuffer> {
    if sample_rate == 0 {
        return Err(NoiseFieldError::invalid("sample_rate", "must be > 0"));
    }
    let params = NoiseParameters::new(kind, x_bias, y_bias)?;
    let samples = generate_samples(&params, buffer_size, || rng.gen::<f32>() * 2.0 - 1.0)?;
    Ok(NoiseBuffer::new(samples, sample_rate))
}

/// Noise generator bound to an output sample rate
pub struct NoiseGenerator {
    rng: StdRng,
    sample_rate: u32,
}

impl NoiseGenerator {
    /// Create a generator; a seed makes the output reproducible
    pub fn new(sample_rate: u32, seed: Option<u64>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(NoiseFieldError::invalid("sample_rate", "must be > 0"));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { rng, sample_rate })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Generate a buffer of exactly `buffer_size` samples
    pub fn generate(&mut self, params: &NoiseParameters, buffer_size: usize) -> Result<NoiseBuffer> {
        let rng = &mut self.rng;
        let samples = generate_samples(params, buffer_size, || rng.gen::<f32>() * 2.0 - 1.0)?;
        tracing::debug!(
            "Generated {} noise: {} samples @ {}Hz (gain {:.3})",
            params.kind,
            samples.len(),
            self.sample_rate,
            params.attenuation()
        );
        Ok(NoiseBuffer::new(samples, self.sample_rate))
    }

    /// Generate `seconds` of audio at the generator's sample rate
    pub fn generate_secs(&mut self, params: &NoiseParameters, seconds: f32) -> Result<NoiseBuffer> {
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(NoiseFieldError::invalid(
                "buffer_seconds",
                format!("must be > 0, got {}", seconds),
            ));
        }
        self.generate(params, buffer_len(self.sample_rate, seconds).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn noise(kind: NoiseType, size: usize, x: f32, y: f32, rng: &mut StdRng) -> Vec<f32> {
        generate(kind, size, x, y, 44100, rng).unwrap().samples().to_vec()
    }

    fn mean(samples: &[f32]) -> f32 {
        samples.iter().sum::<f32>() / samples.len() as f32
    }

    #[test]
    fn test_fixed_source_white_is_scaled_by_bias() {
        let params = NoiseParameters::new(NoiseType::White, 0.5, 0.0).unwrap();
        let mut draws = [0.1f32, -0.2, 0.3, -0.4].into_iter();
        let out = generate_samples(&params, 4, || draws.next().unwrap()).unwrap();

        let expected = [0.05, -0.1, 0.15, -0.2];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_unbiased_white_is_plain_uniform() {
        let out = noise(NoiseType::White, 44100, 0.0, 0.0, &mut seeded());

        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(mean(&out).abs() < 0.02, "mean {}", mean(&out));

        // No attenuation: the extremes of the range are reached
        let peak = out.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.99, "peak {peak}");
    }

    #[test]
    fn test_full_bias_silences_every_type() {
        for kind in NoiseType::ALL {
            for (x, y) in [(1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
                let out = noise(kind, 2048, x, y, &mut seeded());
                assert!(
                    out.iter().all(|s| *s == 0.0),
                    "{kind} noise not silent at x={x}, y={y}"
                );
            }
        }
    }

    #[test]
    fn test_generate_keeps_sample_rate() {
        let buffer = generate(NoiseType::Pink, 480, 0.2, 0.3, 48000, &mut seeded()).unwrap();
        assert_eq!(buffer.len(), 480);
        assert_eq!(buffer.sample_rate(), 48000);
        assert!((buffer.duration_secs() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_amplitude_shrinks_as_bias_grows() {
        let loud = noise(NoiseType::Pink, 8192, 0.1, 0.1, &mut seeded());
        let quiet = noise(NoiseType::Pink, 8192, 0.9, 0.1, &mut seeded());

        let energy = |s: &[f32]| s.iter().map(|v| v * v).sum::<f32>();
        assert!(energy(&quiet) < energy(&loud));
    }

    #[test]
    fn test_brown_runs_differ_but_share_envelope() {
        let a = noise(NoiseType::Brown, 44100, 0.0, 0.0, &mut StdRng::seed_from_u64(1));
        let b = noise(NoiseType::Brown, 44100, 0.0, 0.0, &mut StdRng::seed_from_u64(2));

        assert_ne!(a, b);

        // Steady-state bound of the integrator: |out| <= 0.02/0.02 * 3.5
        for s in a.iter().chain(b.iter()) {
            assert!(s.abs() <= 3.5 + 1e-4, "brown sample {s} escaped the envelope");
        }
    }

    #[test]
    fn test_brown_first_sample_starts_from_zero_state() {
        let params = NoiseParameters::new(NoiseType::Brown, 0.0, 0.0).unwrap();
        let out = generate_samples(&params, 2, || 1.0).unwrap();

        let first = 0.02 / 1.02;
        let second = (first + 0.02) / 1.02;
        assert!((out[0] - first * 3.5).abs() < 1e-6);
        assert!((out[1] - second * 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_pink_first_sample_matches_filter_taps() {
        let params = NoiseParameters::new(NoiseType::Pink, 0.0, 0.0).unwrap();
        let out = generate_samples(&params, 1, || 1.0).unwrap();

        let taps = 0.0555179 + 0.0750759 + 0.1538520 + 0.3104856 + 0.5329522 - 0.0168980;
        let expected = (taps + 0.115926 + 0.5362) * 0.11;
        assert!((out[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_each_call_restarts_filter_state() {
        let params = NoiseParameters::new(NoiseType::Pink, 0.0, 0.0).unwrap();
        let first = generate_samples(&params, 16, || 0.5).unwrap();
        let second = generate_samples(&params, 16, || 0.5).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let mut rng = seeded();
        assert!(generate(NoiseType::White, 0, 0.0, 0.0, 44100, &mut rng).is_err());
        assert!(generate(NoiseType::White, 16, -0.1, 0.0, 44100, &mut rng).is_err());
        assert!(generate(NoiseType::White, 16, 0.0, 1.5, 44100, &mut rng).is_err());
        assert!(generate(NoiseType::White, 16, f32::NAN, 0.0, 44100, &mut rng).is_err());
        assert!(generate(NoiseType::White, 16, 0.0, 0.0, 0, &mut rng).is_err());
    }

    #[test]
    fn test_noise_type_parsing() {
        assert_eq!("Pink".parse::<NoiseType>().unwrap(), NoiseType::Pink);
        assert_eq!(" brown ".parse::<NoiseType>().unwrap(), NoiseType::Brown);
        assert!("violet".parse::<NoiseType>().is_err());
    }

    #[test]
    fn test_generator_buffer_length_and_rate() {
        let mut generator = NoiseGenerator::new(48000, Some(3)).unwrap();
        let buffer = generator
            .generate_secs(&NoiseParameters::default(), 2.0)
            .unwrap();

        assert_eq!(buffer.len(), 96000);
        assert_eq!(buffer.sample_rate(), 48000);
        assert!((buffer.duration_secs() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_seeded_generators_repeat() {
        let params = NoiseParameters::new(NoiseType::Brown, 0.2, 0.3).unwrap();
        let a = NoiseGenerator::new(8000, Some(42)).unwrap().generate(&params, 512).unwrap();
        let b = NoiseGenerator::new(8000, Some(42)).unwrap().generate(&params, 512).unwrap();
        assert_eq!(a.samples(), b.samples());
    }

    #[test]
    fn test_write_wav_round_trip() {
        let path = std::env::temp_dir().join(format!("noisefield-{}.wav", std::process::id()));
        let buffer = NoiseBuffer::new(vec![0.25, -0.5, 0.75], 8000);
        buffer.write_wav(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8000);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.25, -0.5, 0.75]);

        let _ = std::fs::remove_file(path);
    }
}
