//! JSON run configuration for building a pipeline from a file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::errors::SimulationError;
use crate::filters::{Filter, LowpassFilter};
use crate::image::{ImagePipeline, PipelineLevel};
use crate::masks::{CircularMask, Mask};
use crate::scattering::{GridParams, ScatteringConfig};
use crate::specimen::GaussianCloud;
use crate::state::PipelineState;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse run configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Everything needed to build and run one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub level: PipelineLevel,
    pub grid: GridParams,
    pub specimen: GaussianCloud,
    #[serde(default)]
    pub state: PipelineState,
    /// `None` keeps the default antialiasing filter; an empty list disables filtering
    #[serde(default)]
    pub filters: Option<Vec<LowpassFilter>>,
    #[serde(default)]
    pub masks: Vec<CircularMask>,
    #[serde(default)]
    pub seed: u64,
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        log::debug!("Loaded run configuration from {}", path.display());
        Self::from_json_str(&contents)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn build_pipeline(&self) -> Result<ImagePipeline<GaussianCloud>, SimulationError> {
        let config = ScatteringConfig::from_params(&self.grid)?;
        let mut builder = ImagePipeline::builder(self.level, config, self.specimen.clone())
            .state(self.state.clone())
            .masks(self.masks.iter().copied().map(Mask::from).collect());
        if let Some(filters) = &self.filters {
            builder = builder.filters(filters.iter().copied().map(Filter::from).collect());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::Exposure;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"{
        "level": "optics",
        "grid": {"shape": [16, 16], "pixel_size": 1.0, "pad_scale": 1.5},
        "specimen": {"positions": [[0.0, 0.0, 0.0]], "weights": [1.0], "sigma": 1.5}
    }"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = RunConfig::from_json_str(MINIMAL).unwrap();
        assert_eq!(config.level, PipelineLevel::Optics);
        assert_eq!(config.seed, 0);
        assert!(config.filters.is_none());

        let pipeline = config.build_pipeline().unwrap();
        assert_eq!(pipeline.filters().filters().len(), 1);
        assert!(pipeline.masks().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");

        let mut config = RunConfig::from_json_str(MINIMAL).unwrap();
        config.state.exposure = Exposure::uniform(2.0, 0.1);
        config.filters = Some(Vec::new());
        config.masks = vec![CircularMask::new(6.0, 1.0)];
        config.save(&path).unwrap();

        let loaded = RunConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        let pipeline = loaded.build_pipeline().unwrap();
        assert!(pipeline.filters().is_empty());
        assert_eq!(pipeline.masks().masks().len(), 1);
    }

    #[test]
    fn test_errors_are_reported() {
        assert!(matches!(
            RunConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RunConfig::load(Path::new("/nonexistent/run.json")),
            Err(ConfigError::Io(_))
        ));

        let mismatched = MINIMAL.replace("\"weights\": [1.0]", "\"weights\": [1.0, 1.0]");
        assert!(matches!(
            RunConfig::from_json_str(&mismatched),
            Err(ConfigError::Parse(_))
        ));

        let gaussian = MINIMAL.replace("\"optics\"", "\"gaussian\"");
        let config = RunConfig::from_json_str(&gaussian).unwrap();
        assert_eq!(
            config.build_pipeline().unwrap_err(),
            SimulationError::MissingVariance("detector")
        );
    }
}
