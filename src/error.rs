//! Error type shared by the generator, playback and export paths.

/// Errors surfaced by noisefield
#[derive(Debug, thiserror::Error)]
pub enum NoiseFieldError {
    /// No usable audio output device
    #[error("unsupported audio device: {0}")]
    UnsupportedDevice(String),

    /// A parameter was outside its documented domain
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The audio backend failed to build or start a stream
    #[error("audio stream error: {0}")]
    Stream(String),

    /// Window surface or GPU setup failed
    #[error("graphics error: {0}")]
    Graphics(String),

    #[error("WAV export failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NoiseFieldError {
    /// Shorthand for [`NoiseFieldError::InvalidParameter`]
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NoiseFieldError>;
