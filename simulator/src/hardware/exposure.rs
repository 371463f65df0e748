//! Exposure: a uniform gain `N` and offset `mu` applied to the image.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

use crate::errors::{ensure_positive, SimulationError};
use crate::parameters::Parameterized;

/// Rescale an image with gain `n` and offset `mu`.
///
/// In real space every pixel becomes `n * v + mu`. In Fourier space every
/// coefficient is multiplied by `n` and the offset lands on the zero
/// frequency only, scaled by the pixel count (the unnormalized forward FFT
/// of a constant `mu` image).
pub fn rescale_image<T>(image: &Array2<T>, n: f64, mu: f64, real: bool) -> Array2<T>
where
    T: Copy + Mul<f64, Output = T> + Add<f64, Output = T>,
{
    if real {
        return image.mapv(|v| v * n + mu);
    }

    let (rows, cols) = image.dim();
    let mut rescaled = image.mapv(|v| v * n);
    if let Some(dc) = rescaled.get_mut([0, 0]) {
        *dc = *dc + mu * rows as f64 * cols as f64;
    }
    rescaled
}

/// Exposure model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Exposure {
    /// Leaves the image untouched.
    #[default]
    Null,
    Uniform {
        #[serde(rename = "N")]
        n: f64,
        mu: f64,
    },
}

impl Exposure {
    pub fn uniform(n: f64, mu: f64) -> Self {
        Exposure::Uniform { n, mu }
    }

    /// Apply the exposure to a real (`real = true`) or Fourier image.
    pub fn rescale<T>(&self, image: &Array2<T>, real: bool) -> Array2<T>
    where
        T: Copy + Mul<f64, Output = T> + Add<f64, Output = T>,
    {
        match *self {
            Exposure::Null => image.clone(),
            Exposure::Uniform { n, mu } => rescale_image(image, n, mu, real),
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if let Exposure::Uniform { n, .. } = *self {
            ensure_positive("N", n)?;
        }
        Ok(())
    }
}

impl Parameterized for Exposure {
    fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        match (self, name) {
            (Exposure::Uniform { n, .. }, "N") => *n = value,
            (Exposure::Uniform { mu, .. }, "mu") => *mu = value,
            _ => return false,
        }
        true
    }
}
