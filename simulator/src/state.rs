//! The imaging conditions for one exposure.

use serde::{Deserialize, Serialize};

use crate::errors::SimulationError;
use crate::hardware::{Detector, Exposure, OpticsModel};
use crate::ice::Ice;
use crate::parameters::Parameterized;
use crate::pose::Pose;

/// Pose, optics, exposure, ice and detector, bundled.
///
/// Updates never mutate a state in place; [`Parameterized::update`] returns
/// a new one. Parameter names are unique across the stages: pose and CTF
/// fields by name, `N`/`mu` for exposure, `ice_*` and `detector_*` for the
/// noise sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineState {
    pub pose: Pose,
    pub optics: OpticsModel,
    pub exposure: Exposure,
    pub ice: Ice,
    pub detector: Detector,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn with_optics(mut self, optics: OpticsModel) -> Self {
        self.optics = optics;
        self
    }

    pub fn with_exposure(mut self, exposure: Exposure) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn with_ice(mut self, ice: Ice) -> Self {
        self.ice = ice;
        self
    }

    pub fn with_detector(mut self, detector: Detector) -> Self {
        self.detector = detector;
        self
    }

    /// Check every stage's bounds.
    pub fn validate(&self) -> Result<(), SimulationError> {
        self.optics.validate()?;
        self.exposure.validate()?;
        self.ice.validate()?;
        self.detector.validate()?;
        Ok(())
    }
}

impl Parameterized for PipelineState {
    fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        self.pose.set_parameter(name, value)
            || self.optics.set_parameter(name, value)
            || self.exposure.set_parameter(name, value)
            || self.ice.set_parameter(name, value)
            || self.detector.set_parameter(name, value)
    }
}
