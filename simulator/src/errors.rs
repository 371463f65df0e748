//! Error taxonomy for the image-formation pipeline.

use cryo_shared::ArrayError;
use std::fmt;
use thiserror::Error;

use crate::image::PipelineLevel;

/// Bound a parameter is required to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Strictly greater than zero.
    Positive,
    /// Greater than or equal to zero.
    NonNegative,
    /// In the half-open interval (0, 1].
    Fractional,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Constraint::Positive => write!(f, "must be positive"),
            Constraint::NonNegative => write!(f, "must not be negative"),
            Constraint::Fractional => write!(f, "must lie in (0, 1]"),
        }
    }
}

/// Errors raised while configuring or evaluating a pipeline.
///
/// Every error fails the single call that raised it. Nothing here is
/// transient, so there is no retry story.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Shape mismatch at {context}: expected {expected:?}, found {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error(transparent)]
    Array(#[from] ArrayError),

    #[error("{operation} is not defined at the {level} level")]
    NotImplemented {
        level: PipelineLevel,
        operation: &'static str,
    },

    #[error("Parameter {name} = {value} {constraint}")]
    InvalidParameter {
        name: String,
        value: f64,
        constraint: Constraint,
    },

    #[error("No observed data was supplied to the pipeline")]
    MissingObserved,

    #[error("The {0} noise source is null and has no variance")]
    MissingVariance(&'static str),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Fail unless `value > 0`.
pub fn ensure_positive(name: &str, value: f64) -> Result<f64, SimulationError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, value, Constraint::Positive))
    }
}

/// Fail if `value < 0` (or NaN).
pub fn ensure_non_negative(name: &str, value: f64) -> Result<f64, SimulationError> {
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, value, Constraint::NonNegative))
    }
}

/// Fail unless `0 < value <= 1`.
pub fn ensure_fractional(name: &str, value: f64) -> Result<f64, SimulationError> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(invalid(name, value, Constraint::Fractional))
    }
}

fn invalid(name: &str, value: f64, constraint: Constraint) -> SimulationError {
    SimulationError::InvalidParameter {
        name: name.to_string(),
        value,
        constraint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive() {
        assert_eq!(ensure_positive("x", 2.0), Ok(2.0));
        assert!(ensure_positive("x", 0.0).is_err());
        assert!(ensure_positive("x", f64::NAN).is_err());
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(ensure_non_negative("x", 0.0), Ok(0.0));
        assert!(matches!(
            ensure_non_negative("x", -1e-9),
            Err(SimulationError::InvalidParameter {
                constraint: Constraint::NonNegative,
                ..
            })
        ));
    }

    #[test]
    fn test_fractional() {
        assert_eq!(ensure_fractional("a", 1.0), Ok(1.0));
        assert_eq!(ensure_fractional("a", 0.1), Ok(0.1));
        assert!(ensure_fractional("a", 0.0).is_err());
        assert!(ensure_fractional("a", 1.5).is_err());
    }

    #[test]
    fn test_error_message_names_parameter() {
        let err = ensure_fractional("amplitude_contrast", 2.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter amplitude_contrast = 2 must lie in (0, 1]"
        );
    }
}
