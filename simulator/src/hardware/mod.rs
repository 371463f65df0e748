//! Microscope hardware stages: optics, exposure and detector

pub mod detector;
pub mod exposure;
pub mod optics;

pub use detector::Detector;
pub use exposure::{rescale_image, Exposure};
pub use optics::{electron_wavelength, Ctf, OpticsModel, TransferFunction};
