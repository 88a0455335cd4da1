//! Audio analysis and playback configuration.

use crate::error::{NoiseFieldError, Result};

/// Analyser tap configuration (mirrors a browser analyser node's knobs)
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// Transform size in samples (power of 2, 32..=32768)
    pub fft_size: usize,

    /// Weight of the previous frame when smoothing magnitudes (0..=1)
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte value 0 (dB)
    pub min_decibels: f32,

    /// Magnitude mapped to byte value 255 (dB)
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    pub const MIN_FFT_SIZE: usize = 32;
    pub const MAX_FFT_SIZE: usize = 32768;

    /// Number of frequency bins produced per snapshot
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two()
            || !(Self::MIN_FFT_SIZE..=Self::MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(NoiseFieldError::invalid(
                "fft_size",
                format!(
                    "must be a power of 2 in {}..={}, got {}",
                    Self::MIN_FFT_SIZE,
                    Self::MAX_FFT_SIZE,
                    self.fft_size
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(NoiseFieldError::invalid(
                "smoothing_time_constant",
                format!("must be in [0, 1], got {}", self.smoothing_time_constant),
            ));
        }
        if !(self.min_decibels < self.max_decibels) {
            return Err(NoiseFieldError::invalid(
                "min_decibels",
                format!(
                    "must be below max_decibels ({} >= {})",
                    self.min_decibels, self.max_decibels
                ),
            ));
        }
        Ok(())
    }
}

/// Playback behaviour of a noise session
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Generated buffer length (seconds)
    pub buffer_seconds: f32,

    /// Restart from the first sample when the buffer runs out
    pub looped: bool,

    /// Hard clip applied in the output callback after the volume (absolute amplitude)
    pub output_limit: f32,

    /// Initial output gain (0..=1); adjustable while playing
    pub volume: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            buffer_seconds: 2.0,
            looped: true,
            output_limit: 1.0,
            volume: 0.5,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.buffer_seconds.is_finite() && self.buffer_seconds > 0.0) {
            return Err(NoiseFieldError::invalid(
                "buffer_seconds",
                format!("must be > 0, got {}", self.buffer_seconds),
            ));
        }
        if !(self.output_limit > 0.0) {
            return Err(NoiseFieldError::invalid(
                "output_limit",
                format!("must be > 0, got {}", self.output_limit),
            ));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(NoiseFieldError::invalid(
                "volume",
                format!("must be in [0, 1], got {}", self.volume),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_analyser_has_128_bins() {
        let config = AnalyserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frequency_bin_count(), 128);
    }

    #[test]
    fn test_analyser_validation() {
        let bad_size = AnalyserConfig {
            fft_size: 300,
            ..Default::default()
        };
        assert!(bad_size.validate().is_err());

        let too_small = AnalyserConfig {
            fft_size: 16,
            ..Default::default()
        };
        assert!(too_small.validate().is_err());

        let inverted = AnalyserConfig {
            min_decibels: -20.0,
            max_decibels: -40.0,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let smoothing = AnalyserConfig {
            smoothing_time_constant: 1.5,
            ..Default::default()
        };
        assert!(smoothing.validate().is_err());
    }

    #[test]
    fn test_playback_validation() {
        assert!(PlaybackConfig::default().validate().is_ok());
        let empty = PlaybackConfig {
            buffer_seconds: 0.0,
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let loud = PlaybackConfig {
            volume: 1.2,
            ..Default::default()
        };
        assert!(loud.validate().is_err());
    }
}
