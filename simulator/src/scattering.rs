//! Image grid and scattering configuration.

use cryo_shared::{fftfreqs, FrequencyGrid, PadMode};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::errors::SimulationError;

/// Serializable description of an image grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    /// Image shape (rows, cols) in pixels
    pub shape: (usize, usize),
    /// Physical pixel size in Å
    pub pixel_size: f64,
    /// Padding factor applied before projecting, at least 1
    #[serde(default = "default_pad_scale")]
    pub pad_scale: f64,
}

fn default_pad_scale() -> f64 {
    1.0
}

/// Largest padded side length accepted, in pixels.
pub const MAX_PADDED_SIDE: usize = 1 << 16;

/// Immutable image grid: shape, pixel size, padding and frequency grids.
///
/// Projection and filtering happen on the padded grid; everything the
/// pipeline returns is cropped back to `shape`. Frequency grids are in cycles
/// per pixel with the zero frequency at `[0, 0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteringConfig {
    shape: (usize, usize),
    pixel_size: f64,
    pad_scale: f64,
    padded_shape: (usize, usize),
    freqs: FrequencyGrid,
    padded_freqs: FrequencyGrid,
}

impl ScatteringConfig {
    /// Create a grid, computing the padded shape and frequency grids once.
    ///
    /// # Errors
    /// `InvalidConfig` for an empty shape, a non-positive or infinite pixel
    /// size, a pad scale below one or not finite, or a padded side longer
    /// than [`MAX_PADDED_SIDE`].
    pub fn new(
        shape: (usize, usize),
        pixel_size: f64,
        pad_scale: f64,
    ) -> Result<Self, SimulationError> {
        if shape.0 == 0 || shape.1 == 0 {
            return Err(SimulationError::InvalidConfig(format!(
                "image shape {shape:?} has no pixels"
            )));
        }
        if !(pixel_size > 0.0 && pixel_size.is_finite()) {
            return Err(SimulationError::InvalidConfig(format!(
                "pixel size {pixel_size} must be positive"
            )));
        }
        if !(pad_scale >= 1.0 && pad_scale.is_finite()) {
            return Err(SimulationError::InvalidConfig(format!(
                "pad scale {pad_scale} must be finite and at least 1"
            )));
        }

        let padded_rows = (shape.0 as f64 * pad_scale).round();
        let padded_cols = (shape.1 as f64 * pad_scale).round();
        if padded_rows.max(padded_cols) > MAX_PADDED_SIDE as f64 {
            return Err(SimulationError::InvalidConfig(format!(
                "padded shape ({padded_rows}, {padded_cols}) exceeds {MAX_PADDED_SIDE} pixels per side"
            )));
        }
        let padded_shape = (padded_rows as usize, padded_cols as usize);
        log::debug!("Scattering grid {shape:?} padded to {padded_shape:?} at {pixel_size} Å/px");

        Ok(Self {
            shape,
            pixel_size,
            pad_scale,
            padded_shape,
            freqs: fftfreqs(shape),
            padded_freqs: fftfreqs(padded_shape),
        })
    }

    pub fn from_params(params: &GridParams) -> Result<Self, SimulationError> {
        Self::new(params.shape, params.pixel_size, params.pad_scale)
    }

    pub fn params(&self) -> GridParams {
        GridParams {
            shape: self.shape,
            pixel_size: self.pixel_size,
            pad_scale: self.pad_scale,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn padded_shape(&self) -> (usize, usize) {
        self.padded_shape
    }

    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    /// Total number of pixels in the cropped image.
    pub fn size(&self) -> usize {
        self.shape.0 * self.shape.1
    }

    /// Frequencies of the cropped grid, cycles per pixel.
    pub fn freqs(&self) -> &FrequencyGrid {
        &self.freqs
    }

    /// Frequencies of the padded grid, cycles per pixel.
    pub fn padded_freqs(&self) -> &FrequencyGrid {
        &self.padded_freqs
    }

    /// Padded-grid frequencies in inverse Å at the object plane.
    pub fn object_plane_freqs(&self) -> FrequencyGrid {
        self.padded_freqs.scaled(1.0 / self.pixel_size)
    }

    /// Cropped-grid frequencies in inverse Å at the given pixel size.
    pub fn freqs_at(&self, pixel_size: f64) -> FrequencyGrid {
        self.freqs.scaled(1.0 / pixel_size)
    }

    /// Pad an image of `shape` out to `padded_shape`.
    pub fn pad<T: Clone>(
        &self,
        image: &Array2<T>,
        mode: PadMode<T>,
    ) -> Result<Array2<T>, SimulationError> {
        self.check_shape(image, "pad input")?;
        Ok(cryo_shared::pad(image, self.padded_shape, mode)?)
    }

    /// Crop an image of `padded_shape` back to `shape`.
    pub fn crop<T: Clone>(&self, image: &Array2<T>) -> Result<Array2<T>, SimulationError> {
        self.check_padded_shape(image, "crop input")?;
        Ok(cryo_shared::crop(image, self.shape)?)
    }

    /// Fail with `ShapeMismatch` unless `image` has the cropped shape.
    pub fn check_shape<T>(
        &self,
        image: &Array2<T>,
        context: &'static str,
    ) -> Result<(), SimulationError> {
        check(image, self.shape, context)
    }

    /// Fail with `ShapeMismatch` unless `image` has the padded shape.
    pub fn check_padded_shape<T>(
        &self,
        image: &Array2<T>,
        context: &'static str,
    ) -> Result<(), SimulationError> {
        check(image, self.padded_shape, context)
    }
}

fn check<T>(
    image: &Array2<T>,
    expected: (usize, usize),
    context: &'static str,
) -> Result<(), SimulationError> {
    let actual = image.dim();
    if actual != expected {
        return Err(SimulationError::ShapeMismatch {
            context,
            expected,
            actual,
        });
    }
    Ok(())
}
