//! Observed images and their one-time preprocessing.

use cryo_shared::{fft2_real, ifft2_real, PadMode};
use ndarray::Array2;
use num_complex::Complex64;

use crate::errors::SimulationError;
use crate::filters::FilterChain;
use crate::masks::MaskChain;
use crate::scattering::ScatteringConfig;

/// Observed data as supplied by the caller, in either space.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedData {
    Real(Array2<f64>),
    Fourier(Array2<Complex64>),
}

impl ObservedData {
    pub fn dim(&self) -> (usize, usize) {
        match self {
            ObservedData::Real(image) => image.dim(),
            ObservedData::Fourier(spectrum) => spectrum.dim(),
        }
    }

    pub fn to_real(&self) -> Array2<f64> {
        match self {
            ObservedData::Real(image) => image.clone(),
            ObservedData::Fourier(spectrum) => ifft2_real(spectrum),
        }
    }
}

/// Restore `image` to the given mean and (population) standard deviation.
/// A flat image can only be shifted.
pub(crate) fn restore_intensity(image: &Array2<f64>, mean: f64, std: f64) -> Array2<f64> {
    let current_mean = image.mean().unwrap_or(0.0);
    let current_std = image.std(0.0);
    if current_std == 0.0 {
        return image.mapv(|v| v - current_mean + mean);
    }
    image.mapv(|v| (v - current_mean) / current_std * std + mean)
}

/// Bring observed data through the same filter and mask chain as the model.
///
/// The image is padded with its own mean, filtered on the padded grid,
/// cropped back, returned to its raw mean and standard deviation, masked and
/// transformed.
pub(crate) fn preprocess(
    observed: &ObservedData,
    config: &ScatteringConfig,
    filters: &FilterChain,
    masks: &MaskChain,
) -> Result<Array2<Complex64>, SimulationError> {
    if observed.dim() != config.shape() {
        return Err(SimulationError::ShapeMismatch {
            context: "observed data",
            expected: config.shape(),
            actual: observed.dim(),
        });
    }
    let real = observed.to_real();
    let mean = real.mean().unwrap_or(0.0);
    let std = real.std(0.0);
    log::debug!("Preprocessing observed data: mean {mean:.4}, std {std:.4}");

    let padded = fft2_real(&config.pad(&real, PadMode::Constant(mean))?);
    let filtered = ifft2_real(&filters.apply(&padded)?);
    let cropped = config.crop(&filtered)?;
    let restored = restore_intensity(&cropped, mean, std);
    Ok(fft2_real(&masks.apply(&restored)?))
}
