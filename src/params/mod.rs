//! Parameter definitions with units and documented semantics.
//!
//! Every tunable constant of the app lives here with:
//! - Units (seconds, Hz, dB, pixels)
//! - Documented ranges and meanings
//! - Validation where an out-of-range value would break an invariant

mod audio;
mod render;

// Re-export all types
pub use audio::{AnalyserConfig, PlaybackConfig};
pub use render::{RecordingConfig, RenderConfig, RenderModes, SpectrumStyle};
