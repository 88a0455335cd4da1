//! CPU-side visuals drawn into RGBA frames.

pub mod raster;
mod scene;
mod spectrum;

pub use raster::Region;
pub use scene::{PointerState, Scene};
pub use spectrum::SpectrumRenderer;
