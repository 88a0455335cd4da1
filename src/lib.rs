//! noisefield library - pointer-driven noise with a reactive spectrum

pub mod audio;
pub mod cli;
pub mod color;
pub mod error;
pub mod headless;
pub mod noise;
pub mod params;
pub mod rendering;
pub mod visual;

pub use error::{NoiseFieldError, Result};
