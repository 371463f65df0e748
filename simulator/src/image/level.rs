//! Pipeline depth and the capabilities each depth unlocks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How far down the image-formation chain a pipeline goes.
///
/// Each level includes everything the levels before it do.
///
/// | Level      | optics | detector | likelihood |
/// |------------|--------|----------|------------|
/// | Scattering |        |          |            |
/// | Optics     | yes    |          |            |
/// | Detector   | yes    | yes      |            |
/// | Gaussian   | yes    | yes      | yes        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineLevel {
    Scattering,
    Optics,
    Detector,
    Gaussian,
}

impl PipelineLevel {
    pub const ALL: [PipelineLevel; 4] = [
        PipelineLevel::Scattering,
        PipelineLevel::Optics,
        PipelineLevel::Detector,
        PipelineLevel::Gaussian,
    ];

    /// CTF modulation of the signal and the ice.
    pub fn has_optics(&self) -> bool {
        *self >= PipelineLevel::Optics
    }

    /// Pixelization and detector readout noise.
    pub fn has_detector(&self) -> bool {
        *self >= PipelineLevel::Detector
    }

    /// Closed-form Gaussian log-likelihood.
    pub fn has_likelihood(&self) -> bool {
        *self == PipelineLevel::Gaussian
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineLevel::Scattering => "scattering",
            PipelineLevel::Optics => "optics",
            PipelineLevel::Detector => "detector",
            PipelineLevel::Gaussian => "gaussian",
        }
    }
}

impl fmt::Display for PipelineLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_table() {
        let table: Vec<(bool, bool, bool)> = PipelineLevel::ALL
            .iter()
            .map(|l| (l.has_optics(), l.has_detector(), l.has_likelihood()))
            .collect();
        assert_eq!(
            table,
            vec![
                (false, false, false),
                (true, false, false),
                (true, true, false),
                (true, true, true),
            ]
        );
    }

    #[test]
    fn test_display_and_serde_agree() {
        for level in PipelineLevel::ALL {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{level}\""));
        }
    }
}
