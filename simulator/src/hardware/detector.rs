//! Detector: readout noise at the magnified pixel grid plus pixelization.

use cryo_shared::{fft2_real, ifft2_real, resample, FrequencyGrid, InterpolationMethod};
use ndarray::Array2;
use num_complex::Complex64;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{ensure_positive, SimulationError};
use crate::noise::{Kernel, NoiseSource};
use crate::parameters::Parameterized;

/// Detector stage.
///
/// Noise is drawn on the grid at the effective (magnified) pixel size. When
/// `pixel_size` is set and differs from the effective pixel size, images are
/// resampled onto the detector pixels before the noise is added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detector {
    #[serde(default)]
    pub noise: NoiseSource,
    /// Physical detector pixel size in Å, `None` to keep the effective size
    #[serde(default)]
    pub pixel_size: Option<f64>,
    #[serde(default)]
    pub method: InterpolationMethod,
}

impl Detector {
    /// A detector that adds no noise and keeps the effective pixel size.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn gaussian(kernel: Kernel) -> Self {
        Self {
            noise: NoiseSource::gaussian(kernel),
            ..Self::default()
        }
    }

    pub fn with_pixel_size(mut self, pixel_size: f64) -> Self {
        self.pixel_size = Some(pixel_size);
        self
    }

    pub fn with_method(mut self, method: InterpolationMethod) -> Self {
        self.method = method;
        self
    }

    /// Whether `pixelize` would change an image at this effective pixel size.
    pub fn resamples(&self, effective_pixel_size: f64) -> bool {
        matches!(self.pixel_size, Some(px) if px != effective_pixel_size)
    }

    /// Resample a Fourier image from the effective pixel size onto the
    /// detector pixels. The identity when no detector pixel size is set or
    /// the sizes agree.
    pub fn pixelize(
        &self,
        image: &Array2<Complex64>,
        effective_pixel_size: f64,
    ) -> Array2<Complex64> {
        let Some(detector_pixel_size) = self.pixel_size else {
            return image.clone();
        };
        if !self.resamples(effective_pixel_size) {
            return image.clone();
        }
        log::trace!("Pixelizing {effective_pixel_size} Å/px onto {detector_pixel_size} Å/px");
        let real = ifft2_real(image);
        let resampled = resample(
            &real,
            effective_pixel_size,
            detector_pixel_size,
            self.method,
            false,
        );
        fft2_real(&resampled)
    }

    /// Draw readout noise in Fourier space.
    pub fn sample<R: Rng + ?Sized>(&self, freqs: &FrequencyGrid, rng: &mut R) -> Array2<Complex64> {
        self.noise.sample(freqs, rng)
    }

    /// Readout noise variance over `freqs`.
    ///
    /// # Errors
    /// `MissingVariance` when the noise source is null.
    pub fn variance(&self, freqs: &FrequencyGrid) -> Result<Array2<f64>, SimulationError> {
        self.noise
            .as_gaussian()
            .map(|noise| noise.variance(freqs))
            .ok_or(SimulationError::MissingVariance("detector"))
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if let Some(px) = self.pixel_size {
            ensure_positive("detector_pixel_size", px)?;
        }
        self.noise.validate("detector")
    }
}

impl Parameterized for Detector {
    fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        if name == "detector_pixel_size" {
            self.pixel_size = Some(value);
            return true;
        }
        match name.strip_prefix("detector_") {
            Some(field) => self.noise.set_field(field, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cryo_shared::fftfreqs;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bump(shape: (usize, usize)) -> Array2<f64> {
        let (cr, cc) = ((shape.0 as f64 - 1.0) / 2.0, (shape.1 as f64 - 1.0) / 2.0);
        Array2::from_shape_fn(shape, |(i, j)| {
            let r2 = (i as f64 - cr).powi(2) + (j as f64 - cc).powi(2);
            (-r2 / 18.0).exp()
        })
    }

    #[test]
    fn test_pixelize_identity_cases() {
        let image = fft2_real(&bump((16, 16)));

        assert_eq!(Detector::null().pixelize(&image, 1.3), image);
        assert_eq!(
            Detector::null().with_pixel_size(1.3).pixelize(&image, 1.3),
            image
        );
    }

    #[test]
    fn test_pixelize_larger_pixels_shrinks_feature() {
        let image = bump((32, 32));
        let detector = Detector::null()
            .with_pixel_size(2.0)
            .with_method(InterpolationMethod::Bilinear);
        let pixelized = ifft2_real(&detector.pixelize(&fft2_real(&image), 1.0));

        assert_eq!(pixelized.dim(), (32, 32));
        // Twice the pixel size covers a quarter of the area
        let ratio = pixelized.sum() / image.sum();
        assert!(ratio > 0.2 && ratio < 0.35, "area ratio {ratio}");
        assert!(pixelized.iter().cloned().fold(f64::MIN, f64::max) > 0.8);
        assert_abs_diff_eq!(pixelized[[15, 15]], pixelized[[16, 16]], epsilon = 1e-9);
    }

    #[test]
    fn test_null_detector_has_no_variance() {
        let freqs = fftfreqs((8, 8));
        assert_eq!(
            Detector::null().variance(&freqs),
            Err(SimulationError::MissingVariance("detector"))
        );
        let gaussian = Detector::gaussian(Kernel::Constant { variance: 4.0 });
        assert!(gaussian
            .variance(&freqs)
            .unwrap()
            .iter()
            .all(|&v| v == 4.0));
    }

    #[test]
    fn test_null_detector_sample_is_zero() {
        let freqs = fftfreqs((8, 8));
        let noise = Detector::null().sample(&freqs, &mut StdRng::seed_from_u64(0));
        assert!(noise.iter().all(|c| c.norm() == 0.0));
    }

    #[test]
    fn test_prefixed_parameters() {
        let mut detector = Detector::gaussian(Kernel::default());
        assert!(detector.set_parameter("detector_variance", 2.0));
        assert!(detector.set_parameter("detector_pixel_size", 1.5));
        assert!(!detector.set_parameter("variance", 2.0));
        assert!(!detector.set_parameter("ice_variance", 2.0));

        assert_eq!(detector.pixel_size, Some(1.5));
        assert_eq!(detector.noise, NoiseSource::gaussian(Kernel::Constant { variance: 2.0 }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let detector = Detector::null().with_pixel_size(0.0);
        assert!(detector.validate().is_err());

        let detector = Detector::gaussian(Kernel::Constant { variance: -1.0 });
        match detector.validate() {
            Err(SimulationError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "detector_variance")
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
