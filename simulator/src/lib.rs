//! Forward image-formation model for cryo-electron microscopy.
//!
//! A specimen is posed and projected onto a padded grid, filtered, modulated
//! by the microscope's contrast transfer function, cropped, exposed and
//! masked. Sampling adds ice and detector noise; the Gaussian level scores
//! observed data against the rendered image.

pub mod config;
pub mod errors;
pub mod filters;
pub mod hardware;
pub mod ice;
pub mod image;
pub mod masks;
pub mod noise;
pub mod parameters;
pub mod pose;
pub mod scattering;
pub mod specimen;
pub mod state;

pub use config::{ConfigError, RunConfig};
pub use errors::SimulationError;
pub use filters::{Filter, LowpassFilter};
pub use hardware::{Ctf, Detector, Exposure, OpticsModel, TransferFunction};
pub use ice::Ice;
pub use image::{Evaluation, ImagePipeline, ObservedData, PipelineLevel};
pub use masks::{CircularMask, Mask};
pub use noise::{GaussianNoise, Kernel, NoiseSource};
pub use parameters::{ParameterPatch, Parameterized};
pub use pose::Pose;
pub use scattering::{GridParams, ScatteringConfig};
pub use specimen::{GaussianCloud, Specimen};
pub use state::PipelineState;
