//! Noise playback and real-time spectrum analysis.
//!
//! Plays generated noise buffers on the default output device and taps the
//! played signal for byte-scaled frequency snapshots.

mod analyser;
mod system;

// Re-export public types
pub use analyser::{blackman_window, Analyser, FrequencySnapshot, SampleTap};
pub use system::{
    ActiveStream, AudioOutput, OutputDevice, OutputFeed, PlaybackController, PlaybackSession, Volume,
};
