//! Microscope optics: contrast transfer function and magnification.

use cryo_shared::FrequencyGrid;
use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::errors::{ensure_fractional, ensure_non_negative, ensure_positive, SimulationError};
use crate::parameters::Parameterized;

/// Relativistic electron wavelength in Å for an accelerating voltage in kV.
pub fn electron_wavelength(voltage_kv: f64) -> f64 {
    let volts = voltage_kv * 1e3;
    12.264_324_7 / (volts * (1.0 + 0.978_466e-6 * volts)).sqrt()
}

/// Contrast transfer function parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ctf {
    /// Defocus along the major axis in Å (positive is underfocus)
    pub defocus_u: f64,
    /// Defocus along the minor axis in Å
    pub defocus_v: f64,
    /// Astigmatism angle in degrees
    pub defocus_angle: f64,
    /// Accelerating voltage in kV
    pub voltage: f64,
    /// Spherical aberration in mm
    pub spherical_aberration: f64,
    /// Amplitude contrast ratio in (0, 1]
    pub amplitude_contrast: f64,
    /// Additional phase shift in radians
    pub phase_shift: f64,
    /// Envelope B-factor in Å²
    pub b_factor: f64,
}

impl Default for Ctf {
    fn default() -> Self {
        Self {
            defocus_u: 10_000.0,
            defocus_v: 10_000.0,
            defocus_angle: 0.0,
            voltage: 300.0,
            spherical_aberration: 2.7,
            amplitude_contrast: 0.1,
            phase_shift: 0.0,
            b_factor: 0.0,
        }
    }
}

impl Ctf {
    /// A CTF with every aberration switched off and full amplitude contrast.
    /// Its transfer function is exactly one everywhere.
    pub fn aberration_free() -> Self {
        Self {
            defocus_u: 0.0,
            defocus_v: 0.0,
            defocus_angle: 0.0,
            spherical_aberration: 0.0,
            amplitude_contrast: 1.0,
            phase_shift: 0.0,
            b_factor: 0.0,
            ..Self::default()
        }
    }

    /// Evaluate at one frequency `(k_row, k_col)` in inverse Å.
    pub fn evaluate(&self, k_row: f64, k_col: f64) -> f64 {
        let k2 = k_row * k_row + k_col * k_col;
        let theta = k_row.atan2(k_col);
        let angle = self.defocus_angle.to_radians();
        let defocus = 0.5 * (self.defocus_u + self.defocus_v)
            + 0.5 * (self.defocus_u - self.defocus_v) * (2.0 * (theta - angle)).cos();

        let wavelength = electron_wavelength(self.voltage);
        let cs = self.spherical_aberration * 1e7;
        let chi = PI * wavelength * defocus * k2
            - 0.5 * PI * cs * wavelength.powi(3) * k2 * k2
            - self.phase_shift;

        let a = self.amplitude_contrast;
        let envelope = (-self.b_factor * k2 / 4.0).exp();
        (a * chi.cos() - (1.0 - a * a).sqrt() * chi.sin()) * envelope
    }

    fn set_field(&mut self, name: &str, value: f64) -> bool {
        match name {
            "defocus_u" => self.defocus_u = value,
            "defocus_v" => self.defocus_v = value,
            "defocus_angle" => self.defocus_angle = value,
            "voltage" => self.voltage = value,
            "spherical_aberration" => self.spherical_aberration = value,
            "amplitude_contrast" => self.amplitude_contrast = value,
            "phase_shift" => self.phase_shift = value,
            "b_factor" => self.b_factor = value,
            _ => return false,
        }
        true
    }

    fn validate(&self) -> Result<(), SimulationError> {
        ensure_positive("voltage", self.voltage)?;
        ensure_non_negative("spherical_aberration", self.spherical_aberration)?;
        ensure_fractional("amplitude_contrast", self.amplitude_contrast)?;
        ensure_non_negative("b_factor", self.b_factor)?;
        Ok(())
    }
}

/// Which transfer function the optics apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferFunction {
    /// Pass every frequency unchanged.
    #[default]
    Identity,
    Ctf(Ctf),
}

/// Optics stage: a transfer function plus magnification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpticsModel {
    #[serde(default)]
    pub transfer: TransferFunction,
    #[serde(default = "default_magnification")]
    pub magnification: f64,
}

fn default_magnification() -> f64 {
    1.0
}

impl Default for OpticsModel {
    fn default() -> Self {
        Self::identity()
    }
}

impl OpticsModel {
    pub fn identity() -> Self {
        Self {
            transfer: TransferFunction::Identity,
            magnification: 1.0,
        }
    }

    pub fn ctf(ctf: Ctf) -> Self {
        Self {
            transfer: TransferFunction::Ctf(ctf),
            magnification: 1.0,
        }
    }

    pub fn with_magnification(mut self, magnification: f64) -> Self {
        self.magnification = magnification;
        self
    }

    /// Pixel size seen by the detector.
    pub fn effective_pixel_size(&self, pixel_size: f64) -> f64 {
        pixel_size * self.magnification
    }

    /// Transfer function over `freqs` (inverse Å).
    pub fn transfer(&self, freqs: &FrequencyGrid) -> Array2<f64> {
        match &self.transfer {
            TransferFunction::Identity => Array2::ones(freqs.shape()),
            TransferFunction::Ctf(ctf) => freqs.map(|ky, kx| ctf.evaluate(ky, kx)),
        }
    }

    /// Multiply a Fourier-space image by a transfer function.
    pub fn apply(
        &self,
        transfer: &Array2<f64>,
        image: &Array2<Complex64>,
    ) -> Result<Array2<Complex64>, SimulationError> {
        if transfer.dim() != image.dim() {
            return Err(SimulationError::ShapeMismatch {
                context: "optics transfer function",
                expected: image.dim(),
                actual: transfer.dim(),
            });
        }
        Ok(image * &transfer.mapv(|t| Complex64::new(t, 0.0)))
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        ensure_positive("magnification", self.magnification)?;
        if let TransferFunction::Ctf(ctf) = &self.transfer {
            ctf.validate()?;
        }
        Ok(())
    }
}

impl Parameterized for OpticsModel {
    fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        if name == "magnification" {
            self.magnification = value;
            return true;
        }
        match &mut self.transfer {
            TransferFunction::Identity => false,
            TransferFunction::Ctf(ctf) => ctf.set_field(name, value),
        }
    }
}
