//! Image-processing primitives used by the simulator
//!
//! White-noise fields, Gaussian rasterization and PNG export of real-space
//! arrays.

#[cfg(feature = "png-export")]
pub mod export;
pub mod gaussians;
pub mod noise;

pub use gaussians::rasterize_gaussians;
pub use noise::white_noise;
