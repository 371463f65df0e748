//! Variance kernels evaluated over radial frequency.

use cryo_shared::FrequencyGrid;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::errors::{ensure_non_negative, ensure_positive, SimulationError};

/// Power spectrum of a Gaussian noise source as a function of `|k|`.
///
/// Frequencies are in whatever units the grid was scaled to (inverse Å in
/// the pipeline), so `scale` and `width` share those units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Kernel {
    /// White noise: the same variance at every frequency.
    Constant { variance: f64 },
    /// `amplitude * exp(-|k| / scale)`
    Exponential { amplitude: f64, scale: f64 },
    /// `amplitude * exp(-|k|^2 / (2 width^2))`
    Gaussian { amplitude: f64, width: f64 },
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Constant { variance: 1.0 }
    }
}

impl Kernel {
    /// Evaluate the kernel at every coefficient of `freqs`.
    pub fn evaluate(&self, freqs: &FrequencyGrid) -> Array2<f64> {
        match *self {
            Kernel::Constant { variance } => Array2::from_elem(freqs.shape(), variance),
            Kernel::Exponential { amplitude, scale } => {
                freqs.radial().mapv(|k| amplitude * (-k / scale).exp())
            }
            Kernel::Gaussian { amplitude, width } => freqs
                .radial()
                .mapv(|k| amplitude * (-k * k / (2.0 * width * width)).exp()),
        }
    }

    /// Overwrite the field called `field` (the name without its stage prefix).
    pub(crate) fn set_field(&mut self, field: &str, value: f64) -> bool {
        match (self, field) {
            (Kernel::Constant { variance }, "variance") => *variance = value,
            (Kernel::Exponential { amplitude, .. }, "amplitude") => *amplitude = value,
            (Kernel::Exponential { scale, .. }, "scale") => *scale = value,
            (Kernel::Gaussian { amplitude, .. }, "amplitude") => *amplitude = value,
            (Kernel::Gaussian { width, .. }, "width") => *width = value,
            _ => return false,
        }
        true
    }

    /// Check the kernel's bounds, reporting names with `prefix`.
    pub(crate) fn validate(&self, prefix: &str) -> Result<(), SimulationError> {
        match *self {
            Kernel::Constant { variance } => {
                ensure_non_negative(&format!("{prefix}_variance"), variance)?;
            }
            Kernel::Exponential { amplitude, scale } => {
                ensure_non_negative(&format!("{prefix}_amplitude"), amplitude)?;
                ensure_positive(&format!("{prefix}_scale"), scale)?;
            }
            Kernel::Gaussian { amplitude, width } => {
                ensure_non_negative(&format!("{prefix}_amplitude"), amplitude)?;
                ensure_positive(&format!("{prefix}_width"), width)?;
            }
        }
        Ok(())
    }
}
