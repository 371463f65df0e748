//! The image-formation pipeline.
//!
//! A pipeline holds a grid, a specimen, the imaging state, filter and mask
//! chains, and optionally preprocessed observed data. Every image it returns
//! is a Fourier-space array with the grid's (cropped) shape, except
//! `render(.., view = false)` which returns the padded image before the final
//! crop, exposure and mask.
//!
//! Signal path, padded grid then cropped grid:
//!
//! ```text
//! scatter -> filter -> [CTF] -> crop -> exposure -> mask -> [pixelize]
//! ```
//!
//! Ice is drawn at the object-plane pixel size and follows the signal through
//! filter, CTF, crop and mask (exposure is not applied to noise). Detector
//! noise is drawn on the cropped grid at the effective pixel size and only
//! masked.

pub mod level;
pub mod observed;

use cryo_shared::{fft2, ifft2};
use ndarray::Array2;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::Arc;

use crate::errors::SimulationError;
use crate::filters::{Filter, FilterChain, LowpassFilter};
use crate::masks::{Mask, MaskChain};
use crate::parameters::{ParameterPatch, Parameterized};
use crate::scattering::ScatteringConfig;
use crate::specimen::Specimen;
use crate::state::PipelineState;

pub use level::PipelineLevel;
pub use observed::ObservedData;

/// Result of [`ImagePipeline::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Sample(Array2<Complex64>),
    LogLikelihood(f64),
}

/// Builder for [`ImagePipeline`]. All derived data is computed in
/// [`ImagePipelineBuilder::build`].
#[derive(Debug, Clone)]
pub struct ImagePipelineBuilder<S: Specimen> {
    level: PipelineLevel,
    config: ScatteringConfig,
    specimen: S,
    state: PipelineState,
    filters: Option<Vec<Filter>>,
    masks: Vec<Mask>,
    observed: Option<ObservedInput>,
}

#[derive(Debug, Clone)]
enum ObservedInput {
    Raw(ObservedData),
    Preprocessed(Array2<Complex64>),
}

impl<S: Specimen> ImagePipelineBuilder<S> {
    pub fn state(mut self, state: PipelineState) -> Self {
        self.state = state;
        self
    }

    /// Replace the default filter list (a single antialiasing low-pass).
    /// An empty list disables filtering.
    pub fn filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn masks(mut self, masks: Vec<Mask>) -> Self {
        self.masks = masks;
        self
    }

    /// Raw observed data, preprocessed once in `build`.
    pub fn observed(mut self, observed: ObservedData) -> Self {
        self.observed = Some(ObservedInput::Raw(observed));
        self
    }

    /// Fourier-space data that has already been filtered and masked. Held
    /// as-is; only its shape is checked.
    pub fn observed_preprocessed(mut self, observed: Array2<Complex64>) -> Self {
        self.observed = Some(ObservedInput::Preprocessed(observed));
        self
    }

    /// Evaluate filters and masks, preprocess the observed data, and check
    /// the level's requirements.
    ///
    /// # Errors
    /// * `MissingVariance` for a Gaussian pipeline whose detector is null
    /// * `ShapeMismatch` for observed data or custom filters/masks of the wrong shape
    /// * `InvalidParameter` for out-of-range filter or mask settings
    pub fn build(self) -> Result<ImagePipeline<S>, SimulationError> {
        if self.level.has_likelihood() && self.state.detector.noise.as_gaussian().is_none() {
            return Err(SimulationError::MissingVariance("detector"));
        }

        let filters = self
            .filters
            .unwrap_or_else(|| vec![Filter::Lowpass(LowpassFilter::default())]);
        let filters = FilterChain::new(filters, self.config.padded_freqs())?;
        let masks = MaskChain::new(self.masks, self.config.shape())?;

        let observed = match self.observed {
            None => None,
            Some(ObservedInput::Raw(data)) => Some(observed::preprocess(
                &data,
                &self.config,
                &filters,
                &masks,
            )?),
            Some(ObservedInput::Preprocessed(spectrum)) => {
                self.config.check_shape(&spectrum, "preprocessed observed data")?;
                Some(spectrum)
            }
        };

        log::debug!(
            "Built {} pipeline on {:?} (padded {:?}) with {} filter(s), {} mask(s), observed: {}",
            self.level,
            self.config.shape(),
            self.config.padded_shape(),
            filters.filters().len(),
            masks.masks().len(),
            observed.is_some()
        );

        Ok(ImagePipeline {
            level: self.level,
            config: Arc::new(self.config),
            specimen: self.specimen,
            state: self.state,
            filters: Arc::new(filters),
            masks: Arc::new(masks),
            observed: observed.map(Arc::new),
        })
    }
}

/// Immutable image-formation pipeline.
///
/// Cloning and [`ImagePipeline::update`] share the grid, filter, mask and
/// observed buffers.
#[derive(Debug, Clone)]
pub struct ImagePipeline<S: Specimen> {
    level: PipelineLevel,
    config: Arc<ScatteringConfig>,
    specimen: S,
    state: PipelineState,
    filters: Arc<FilterChain>,
    masks: Arc<MaskChain>,
    observed: Option<Arc<Array2<Complex64>>>,
}

impl<S: Specimen> ImagePipeline<S> {
    pub fn builder(
        level: PipelineLevel,
        config: ScatteringConfig,
        specimen: S,
    ) -> ImagePipelineBuilder<S> {
        ImagePipelineBuilder {
            level,
            config,
            specimen,
            state: PipelineState::default(),
            filters: None,
            masks: Vec::new(),
            observed: None,
        }
    }

    pub fn level(&self) -> PipelineLevel {
        self.level
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn specimen(&self) -> &S {
        &self.specimen
    }

    pub fn config(&self) -> &ScatteringConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn masks(&self) -> &MaskChain {
        &self.masks
    }

    /// Preprocessed observed data in Fourier space.
    pub fn observed(&self) -> Option<&Array2<Complex64>> {
        self.observed.as_deref()
    }

    /// The shared observed buffer, for callers that need to compare identity.
    pub fn observed_shared(&self) -> Option<&Arc<Array2<Complex64>>> {
        self.observed.as_ref()
    }

    /// Render the noiseless image.
    ///
    /// # Arguments
    /// * `state` - Hardware and pose to render with, `None` for the pipeline's own
    /// * `specimen` - Specimen to project, `None` for the pipeline's own
    /// * `view` - Crop, expose, mask and (at the detector level) pixelize the result
    ///
    /// # Returns
    /// Fourier image with `config.shape()`, or the padded shape when `view` is false
    pub fn render(
        &self,
        state: Option<&PipelineState>,
        specimen: Option<&S>,
        view: bool,
    ) -> Result<Array2<Complex64>, SimulationError> {
        let state = state.unwrap_or(&self.state);
        let specimen = specimen.unwrap_or(&self.specimen);
        self.validate(state, specimen)?;

        let padded = self.render_padded(state, specimen)?;
        if !view {
            return Ok(padded);
        }
        let viewed = self.view(state, &padded)?;
        if self.level.has_detector() {
            let effective = state.optics.effective_pixel_size(self.config.pixel_size());
            return Ok(state.detector.pixelize(&viewed, effective));
        }
        Ok(viewed)
    }

    /// Render and add one realization of every non-null noise source.
    ///
    /// Ice is drawn first, then detector noise, from a single generator.
    ///
    /// # Arguments
    /// * `state` - Hardware and pose to sample with, `None` for the pipeline's own
    /// * `specimen` - Specimen to project, `None` for the pipeline's own
    /// * `seed` - Seed for the noise generator; equal seeds give equal images
    ///
    /// # Returns
    /// Viewed Fourier image with `config.shape()`
    pub fn sample(
        &self,
        state: Option<&PipelineState>,
        specimen: Option<&S>,
        seed: u64,
    ) -> Result<Array2<Complex64>, SimulationError> {
        let state = state.unwrap_or(&self.state);
        let specimen = specimen.unwrap_or(&self.specimen);
        self.validate(state, specimen)?;
        let mut rng = StdRng::seed_from_u64(seed);

        let padded = self.render_padded(state, specimen)?;
        let mut image = self.view(state, &padded)?;

        if !state.ice.is_null() {
            log::trace!("Sampling ice at {} Å/px", self.config.pixel_size());
            let mut ice = self
                .filters
                .apply(&state.ice.sample(&self.config.object_plane_freqs(), &mut rng))?;
            if self.level.has_optics() {
                let ctf = state.optics.transfer(&self.config.object_plane_freqs());
                ice = state.optics.apply(&ctf, &ice)?;
            }
            image = image + self.view_noise(&ice)?;
        }

        if self.level.has_detector() {
            let effective = state.optics.effective_pixel_size(self.config.pixel_size());
            image = state.detector.pixelize(&image, effective);
            if !state.detector.noise.is_null() {
                log::trace!("Sampling detector noise at {effective} Å/px");
                let noise = state
                    .detector
                    .sample(&self.config.freqs_at(effective), &mut rng);
                image = image + fft2(&self.masks.apply(&ifft2(&noise))?);
            }
        }
        Ok(image)
    }

    /// `observed - render(state, specimen)`, both in Fourier space.
    ///
    /// # Errors
    /// `MissingObserved` when the pipeline holds no observed data.
    pub fn residuals(
        &self,
        state: Option<&PipelineState>,
        specimen: Option<&S>,
    ) -> Result<Array2<Complex64>, SimulationError> {
        let observed = self
            .observed
            .as_deref()
            .ok_or(SimulationError::MissingObserved)?;
        let simulated = self.render(state, specimen, true)?;
        Ok(observed - &simulated)
    }

    /// Gaussian negative log-likelihood per coefficient,
    /// `Re sum(r conj(r) / (2 variance)) / n`.
    ///
    /// Variance is the detector variance at the effective pixel size plus,
    /// for Gaussian ice, `ctf^2 * ice variance` at the object-plane pixel
    /// size. Zero variance is not guarded.
    ///
    /// # Arguments
    /// * `state` - Hardware and pose to score, `None` for the pipeline's own
    /// * `specimen` - Specimen to score, `None` for the pipeline's own
    ///
    /// # Returns
    /// Mean negative log-likelihood over the image's Fourier coefficients
    ///
    /// # Errors
    /// * `NotImplemented` below the Gaussian level
    /// * `MissingObserved` without observed data
    /// * `MissingVariance` if `state` carries a null detector
    pub fn log_likelihood(
        &self,
        state: Option<&PipelineState>,
        specimen: Option<&S>,
    ) -> Result<f64, SimulationError> {
        if !self.level.has_likelihood() {
            return Err(SimulationError::NotImplemented {
                level: self.level,
                operation: "log_likelihood",
            });
        }
        let state_ref = state.unwrap_or(&self.state);
        let residuals = self.residuals(Some(state_ref), specimen)?;

        let pixel_size = self.config.pixel_size();
        let effective = state_ref.optics.effective_pixel_size(pixel_size);
        let mut variance = state_ref
            .detector
            .variance(&self.config.freqs_at(effective))?;
        let object_freqs = self.config.freqs_at(pixel_size);
        if let Some(ice_variance) = state_ref.ice.variance(&object_freqs) {
            let ctf = state_ref.optics.transfer(&object_freqs);
            variance = variance + ctf.mapv(|t| t * t) * ice_variance;
        }

        let loss: f64 = residuals
            .iter()
            .zip(variance.iter())
            .map(|(r, v)| (r * r.conj()).re / (2.0 * v))
            .sum();
        Ok(loss / self.config.size() as f64)
    }

    /// Apply a patch, then sample (no observed data) or score (observed
    /// data held). `sample` and `log_likelihood` remain the primary entry
    /// points; this is shorthand for parameter sweeps.
    pub fn evaluate(&self, patch: &ParameterPatch, seed: u64) -> Result<Evaluation, SimulationError> {
        let (state, specimen) = self.patched(patch)?;
        if self.observed.is_none() {
            self.sample(Some(&state), Some(&specimen), seed)
                .map(Evaluation::Sample)
        } else {
            self.log_likelihood(Some(&state), Some(&specimen))
                .map(Evaluation::LogLikelihood)
        }
    }

    /// New pipeline with `patch` applied to the state and specimen. Every
    /// name must belong to one of them.
    pub fn update(&self, patch: &ParameterPatch) -> Result<Self, SimulationError> {
        let (state, specimen) = self.patched(patch)?;
        Ok(Self {
            state,
            specimen,
            ..self.clone()
        })
    }

    /// One sample per seed, evaluated in parallel.
    pub fn sample_batch(&self, seeds: &[u64]) -> Result<Vec<Array2<Complex64>>, SimulationError> {
        seeds
            .par_iter()
            .map(|&seed| self.sample(None, None, seed))
            .collect()
    }

    /// One log-likelihood per patch, evaluated in parallel.
    pub fn log_likelihood_batch(
        &self,
        patches: &[ParameterPatch],
    ) -> Result<Vec<f64>, SimulationError> {
        patches
            .par_iter()
            .map(|patch| {
                let (state, specimen) = self.patched(patch)?;
                self.log_likelihood(Some(&state), Some(&specimen))
            })
            .collect()
    }

    fn patched(&self, patch: &ParameterPatch) -> Result<(PipelineState, S), SimulationError> {
        let mut state = self.state.clone();
        let mut specimen = self.specimen.clone();
        for (name, value) in patch.iter() {
            if !state.set_parameter(name, value) && !specimen.set_parameter(name, value) {
                return Err(SimulationError::UnknownParameter(name.to_string()));
            }
        }
        Ok((state, specimen))
    }

    fn validate(&self, state: &PipelineState, specimen: &S) -> Result<(), SimulationError> {
        state.validate()?;
        specimen.validate()
    }

    /// Filtered projection on the padded grid, CTF-modulated at the optics
    /// level and above.
    fn render_padded(
        &self,
        state: &PipelineState,
        specimen: &S,
    ) -> Result<Array2<Complex64>, SimulationError> {
        let projection = specimen.scatter(&state.pose, &self.config)?;
        self.config
            .check_padded_shape(&projection, "specimen projection")?;
        let filtered = self.filters.apply(&projection)?;
        if !self.level.has_optics() {
            return Ok(filtered);
        }
        log::trace!("Applying optics at magnification {}", state.optics.magnification);
        let ctf = state.optics.transfer(&self.config.object_plane_freqs());
        state.optics.apply(&ctf, &filtered)
    }

    /// Crop, expose and mask a padded signal image.
    fn view(
        &self,
        state: &PipelineState,
        padded: &Array2<Complex64>,
    ) -> Result<Array2<Complex64>, SimulationError> {
        let cropped = self.config.crop(&ifft2(padded))?;
        let exposed = state.exposure.rescale(&cropped, true);
        Ok(fft2(&self.masks.apply(&exposed)?))
    }

    /// Crop and mask a padded noise image.
    fn view_noise(&self, padded: &Array2<Complex64>) -> Result<Array2<Complex64>, SimulationError> {
        let cropped = self.config.crop(&ifft2(padded))?;
        Ok(fft2(&self.masks.apply(&cropped)?))
    }
}
