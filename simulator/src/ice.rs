//! Vitreous ice background, drawn at the object plane before the optics.

use cryo_shared::FrequencyGrid;
use ndarray::Array2;
use num_complex::Complex64;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::SimulationError;
use crate::noise::{Kernel, NoiseSource};
use crate::parameters::Parameterized;

/// Ice stage. Parameters are addressed as `ice_<kernel field>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ice {
    #[serde(default)]
    pub noise: NoiseSource,
}

impl Ice {
    pub fn null() -> Self {
        Self::default()
    }

    pub fn gaussian(kernel: Kernel) -> Self {
        Self {
            noise: NoiseSource::gaussian(kernel),
        }
    }

    pub fn is_null(&self) -> bool {
        self.noise.is_null()
    }

    pub fn sample<R: Rng + ?Sized>(&self, freqs: &FrequencyGrid, rng: &mut R) -> Array2<Complex64> {
        self.noise.sample(freqs, rng)
    }

    /// Ice variance, or `None` for a null background.
    pub fn variance(&self, freqs: &FrequencyGrid) -> Option<Array2<f64>> {
        self.noise.as_gaussian().map(|noise| noise.variance(freqs))
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        self.noise.validate("ice")
    }
}

impl Parameterized for Ice {
    fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        name.strip_prefix("ice_")
            .is_some_and(|field| self.noise.set_field(field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryo_shared::fftfreqs;

    #[test]
    fn test_null_ice_has_no_variance() {
        assert!(Ice::null().variance(&fftfreqs((4, 4))).is_none());
        assert!(Ice::null().is_null());
    }

    #[test]
    fn test_ice_parameters_are_prefixed() {
        let mut ice = Ice::gaussian(Kernel::Gaussian {
            amplitude: 1.0,
            width: 0.1,
        });
        assert!(ice.set_parameter("ice_width", 0.2));
        assert!(!ice.set_parameter("width", 0.3));
        assert!(!ice.set_parameter("ice_variance", 1.0));
        assert_eq!(
            ice,
            Ice::gaussian(Kernel::Gaussian {
                amplitude: 1.0,
                width: 0.2
            })
        );
    }

    #[test]
    fn test_validate_names_ice_field() {
        let ice = Ice::gaussian(Kernel::Constant { variance: -2.0 });
        match ice.validate() {
            Err(SimulationError::InvalidParameter { name, .. }) => assert_eq!(name, "ice_variance"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
