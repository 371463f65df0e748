//! Specimens and their scattering projections.

use cryo_shared::fft2_real;
use cryo_shared::image_proc::rasterize_gaussians;
use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::{ensure_positive, SimulationError};
use crate::parameters::Parameterized;
use crate::pose::Pose;
use crate::scattering::ScatteringConfig;

/// Something that can be viewed under a pose and projected.
pub trait Specimen: Parameterized + Debug + Send + Sync {
    /// Project the specimen onto the padded grid of `config`, returning the
    /// Fourier transform of the projected density.
    fn scatter(
        &self,
        pose: &Pose,
        config: &ScatteringConfig,
    ) -> Result<Array2<Complex64>, SimulationError>;

    /// Check parameter bounds. Called at evaluation time.
    fn validate(&self) -> Result<(), SimulationError> {
        Ok(())
    }
}

/// Point cloud of isotropic Gaussian densities sharing one width.
///
/// Positions are `[x, y, z]` in Å about the specimen center; the beam runs
/// along z so projection integrates z out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CloudRecord")]
pub struct GaussianCloud {
    pub positions: Vec<[f64; 3]>,
    pub weights: Vec<f64>,
    /// Gaussian standard deviation in Å
    pub sigma: f64,
}

/// Unchecked serialized form, converted through [`GaussianCloud::new`].
#[derive(Deserialize)]
struct CloudRecord {
    positions: Vec<[f64; 3]>,
    weights: Vec<f64>,
    sigma: f64,
}

impl TryFrom<CloudRecord> for GaussianCloud {
    type Error = SimulationError;

    fn try_from(record: CloudRecord) -> Result<Self, Self::Error> {
        Self::new(record.positions, record.weights, record.sigma)
    }
}

impl GaussianCloud {
    pub fn new(
        positions: Vec<[f64; 3]>,
        weights: Vec<f64>,
        sigma: f64,
    ) -> Result<Self, SimulationError> {
        let cloud = Self {
            positions,
            weights,
            sigma,
        };
        cloud.check_lengths()?;
        Ok(cloud)
    }

    fn check_lengths(&self) -> Result<(), SimulationError> {
        if self.positions.len() != self.weights.len() {
            return Err(SimulationError::InvalidConfig(format!(
                "{} positions but {} weights",
                self.positions.len(),
                self.weights.len()
            )));
        }
        Ok(())
    }

    /// A cloud where every point carries unit weight.
    pub fn uniform(positions: Vec<[f64; 3]>, sigma: f64) -> Self {
        let weights = vec![1.0; positions.len()];
        Self {
            positions,
            weights,
            sigma,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl Specimen for GaussianCloud {
    fn scatter(
        &self,
        pose: &Pose,
        config: &ScatteringConfig,
    ) -> Result<Array2<Complex64>, SimulationError> {
        let centers: Vec<(f64, f64)> = pose
            .transform_all(&self.positions)
            .into_iter()
            .map(|[x, y, _]| (y, x))
            .collect();
        let density = rasterize_gaussians(
            config.padded_shape(),
            config.pixel_size(),
            &centers,
            &self.weights,
            self.sigma,
        )?;
        log::trace!("Projected {} Gaussians onto {:?}", self.len(), density.dim());
        Ok(fft2_real(&density))
    }

    fn validate(&self) -> Result<(), SimulationError> {
        self.check_lengths()?;
        ensure_positive("specimen_sigma", self.sigma)?;
        Ok(())
    }
}

impl Parameterized for GaussianCloud {
    fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        match name {
            "specimen_sigma" => self.sigma = value,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cryo_shared::ifft2_real;

    fn config() -> ScatteringConfig {
        ScatteringConfig::new((16, 16), 1.0, 1.5).unwrap()
    }

    #[test]
    fn test_projection_lands_on_padded_grid() {
        let cloud = GaussianCloud::uniform(vec![[0.0, 0.0, 0.0]], 1.5);
        let spectrum = cloud.scatter(&Pose::default(), &config()).unwrap();

        assert_eq!(spectrum.dim(), (24, 24));
        // DC coefficient is the integrated density
        assert_relative_eq!(spectrum[[0, 0]].re, 1.0, epsilon = 1e-6);

        let density = ifft2_real(&spectrum);
        let peak = density
            .indexed_iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx);
        assert_eq!(peak, Some((12, 12)));
    }

    #[test]
    fn test_pose_moves_the_projection() {
        let cloud = GaussianCloud::uniform(vec![[3.0, 0.0, 0.0]], 1.0);
        let pose = Pose::new(90.0, 0.0, 0.0);
        let density = ifft2_real(&cloud.scatter(&pose, &config()).unwrap());

        // x -> y under a quarter turn about z, so the peak moves along rows
        let peak = density
            .indexed_iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx);
        assert_eq!(peak, Some((15, 12)));
    }

    #[test]
    fn test_depth_does_not_change_projection() {
        let near = GaussianCloud::uniform(vec![[1.0, 2.0, -5.0]], 1.0);
        let far = GaussianCloud::uniform(vec![[1.0, 2.0, 5.0]], 1.0);
        let pose = Pose::default();
        assert_eq!(
            near.scatter(&pose, &config()).unwrap(),
            far.scatter(&pose, &config()).unwrap()
        );
    }

    #[test]
    fn test_mismatched_weights_rejected() {
        assert!(GaussianCloud::new(vec![[0.0; 3]], vec![], 1.0).is_err());

        let mut cloud = GaussianCloud::uniform(vec![[0.0; 3]], 1.0);
        cloud.weights.push(2.0);
        assert!(matches!(
            cloud.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_deserialization_checks_lengths() {
        let cloud: GaussianCloud = serde_json::from_str(
            r#"{"positions": [[1.0, 2.0, 3.0]], "weights": [0.5], "sigma": 2.0}"#,
        )
        .unwrap();
        assert_eq!(cloud.weights, vec![0.5]);

        let mismatched = serde_json::from_str::<GaussianCloud>(
            r#"{"positions": [[0.0, 0.0, 0.0]], "weights": [1.0, 2.0], "sigma": 1.0}"#,
        );
        let message = mismatched.unwrap_err().to_string();
        assert!(message.contains("1 positions but 2 weights"), "{message}");
    }

    #[test]
    fn test_sigma_parameter_and_validation() {
        let cloud = GaussianCloud::uniform(vec![[0.0; 3]], 1.0);
        let patched = cloud
            .update(&crate::parameters::ParameterPatch::new().with("specimen_sigma", -1.0))
            .unwrap();
        assert_eq!(cloud.sigma, 1.0);
        assert!(matches!(
            patched.validate(),
            Err(SimulationError::InvalidParameter { .. })
        ));
    }
}
