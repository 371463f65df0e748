//! Numeric helpers shared by the cryo-EM image simulator.
//!
//! Nothing in here knows about microscopes. The modules provide the array
//! plumbing the image-formation pipeline leans on:
//!
//! - [`fft`]: 2D FFT pair and frequency grids (zero frequency at `[0, 0]`)
//! - [`boundaries`]: centered crop and pad
//! - [`interpolation`]: separable resampling between pixel sizes
//! - [`image_proc`]: white-noise fields, Gaussian rasterization, PNG export

pub mod boundaries;
pub mod fft;
pub mod image_proc;
pub mod interpolation;

pub use boundaries::{crop, pad, ArrayError, PadMode};
pub use fft::{fft2, fft2_real, fftfreqs, ifft2, ifft2_real, FrequencyGrid};
pub use interpolation::{resample, InterpolationMethod};
