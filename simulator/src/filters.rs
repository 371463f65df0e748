//! Fourier-space filters applied to images on the padded grid.

use cryo_shared::FrequencyGrid;
use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::errors::{ensure_fractional, ensure_non_negative, SimulationError};

/// Low-pass filter with a raised-cosine edge.
///
/// `cutoff` and `rolloff` are fractions of the largest frequency on the grid
/// (Nyquist for a grid in cycles per pixel). Frequencies below the cutoff
/// pass unchanged and the response falls to zero over the roll-off width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowpassFilter {
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
    #[serde(default = "default_rolloff")]
    pub rolloff: f64,
}

fn default_cutoff() -> f64 {
    0.667
}

fn default_rolloff() -> f64 {
    0.05
}

impl Default for LowpassFilter {
    fn default() -> Self {
        Self {
            cutoff: default_cutoff(),
            rolloff: default_rolloff(),
        }
    }
}

impl LowpassFilter {
    pub fn new(cutoff: f64, rolloff: f64) -> Self {
        Self { cutoff, rolloff }
    }

    /// Filter response at every coefficient of `freqs`.
    pub fn evaluate(&self, freqs: &FrequencyGrid) -> Array2<f64> {
        let k_max = freqs.max_component();
        let k_cut = self.cutoff * k_max;
        let width = self.rolloff * k_max;
        freqs.radial().mapv(|k| cosine_edge(k, k_cut, width))
    }
}

/// 1 up to `edge`, a half cosine down to 0 over `width`, then 0.
pub(crate) fn cosine_edge(x: f64, edge: f64, width: f64) -> f64 {
    if x <= edge {
        1.0
    } else if x >= edge + width {
        0.0
    } else {
        0.5 * (1.0 + (PI * (x - edge) / width).cos())
    }
}

/// A Fourier-space filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Lowpass(LowpassFilter),
    /// Precomputed response with the padded grid's shape.
    Kernel(Array2<f64>),
}

impl From<LowpassFilter> for Filter {
    fn from(filter: LowpassFilter) -> Self {
        Filter::Lowpass(filter)
    }
}

impl Filter {
    fn evaluate(&self, freqs: &FrequencyGrid) -> Result<Array2<f64>, SimulationError> {
        match self {
            Filter::Lowpass(lowpass) => {
                ensure_fractional("cutoff", lowpass.cutoff)?;
                ensure_non_negative("rolloff", lowpass.rolloff)?;
                Ok(lowpass.evaluate(freqs))
            }
            Filter::Kernel(response) => {
                if response.dim() != freqs.shape() {
                    return Err(SimulationError::ShapeMismatch {
                        context: "filter kernel",
                        expected: freqs.shape(),
                        actual: response.dim(),
                    });
                }
                Ok(response.clone())
            }
        }
    }
}

/// Ordered filters, evaluated once and folded into a single response.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    filters: Vec<Filter>,
    response: Option<Array2<f64>>,
}

impl FilterChain {
    /// Evaluate every filter on `freqs` (the padded grid).
    pub fn new(filters: Vec<Filter>, freqs: &FrequencyGrid) -> Result<Self, SimulationError> {
        let mut response: Option<Array2<f64>> = None;
        for filter in &filters {
            let next = filter.evaluate(freqs)?;
            response = Some(match response {
                Some(acc) => acc * next,
                None => next,
            });
        }
        Ok(Self { filters, response })
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply every filter in order to a padded Fourier image.
    pub fn apply(&self, image: &Array2<Complex64>) -> Result<Array2<Complex64>, SimulationError> {
        let Some(response) = &self.response else {
            return Ok(image.clone());
        };
        if response.dim() != image.dim() {
            return Err(SimulationError::ShapeMismatch {
                context: "filter input",
                expected: response.dim(),
                actual: image.dim(),
            });
        }
        let mut filtered = image.clone();
        filtered.zip_mut_with(response, |c, &r| *c *= r);
        Ok(filtered)
    }
}
