//! Named parameter patches and the update protocol.
//!
//! A [`ParameterPatch`] maps leaf-parameter names (`"defocus_u"`, `"N"`,
//! `"ice_variance"`, ...) to new values. Components implement
//! [`Parameterized`] to accept the names they own; updates always build a new
//! value and leave the original untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::SimulationError;

/// Ordered map from parameter name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterPatch {
    values: BTreeMap<String, f64>,
}

impl ParameterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParameterPatch {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut patch = Self::new();
        for (name, value) in iter {
            patch.set(name, value);
        }
        patch
    }
}

/// A component whose scalar leaf parameters can be overwritten by name.
pub trait Parameterized: Clone {
    /// Overwrite the parameter called `name`. Returns `false` when this
    /// component does not own a parameter of that name.
    fn set_parameter(&mut self, name: &str, value: f64) -> bool;

    /// Return a copy with every entry of `patch` applied.
    ///
    /// Fails with [`SimulationError::UnknownParameter`] on the first name the
    /// component does not own.
    fn update(&self, patch: &ParameterPatch) -> Result<Self, SimulationError> {
        let mut next = self.clone();
        for (name, value) in patch.iter() {
            if !next.set_parameter(name, value) {
                return Err(SimulationError::UnknownParameter(name.to_string()));
            }
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Gain {
        n: f64,
    }

    impl Parameterized for Gain {
        fn set_parameter(&mut self, name: &str, value: f64) -> bool {
            match name {
                "N" => self.n = value,
                _ => return false,
            }
            true
        }
    }

    #[test]
    fn test_patch_builder_and_lookup() {
        let patch = ParameterPatch::new().with("N", 2.0).with("mu", 0.5);

        assert_eq!(patch.len(), 2);
        assert_eq!(patch.get("N"), Some(2.0));
        assert_eq!(patch.get("missing"), None);
    }

    #[test]
    fn test_patch_from_iterator_keeps_last_value() {
        let patch: ParameterPatch = vec![("N", 1.0), ("N", 3.0)].into_iter().collect();
        assert_eq!(patch.get("N"), Some(3.0));
    }

    #[test]
    fn test_update_returns_new_value() {
        let gain = Gain { n: 1.0 };
        let updated = gain.update(&ParameterPatch::new().with("N", 4.0)).unwrap();

        assert_eq!(gain.n, 1.0);
        assert_eq!(updated.n, 4.0);
    }

    #[test]
    fn test_update_rejects_unknown_name() {
        let gain = Gain { n: 1.0 };
        let result = gain.update(&ParameterPatch::new().with("gain", 4.0));
        assert_eq!(
            result,
            Err(SimulationError::UnknownParameter("gain".to_string()))
        );
    }

    #[test]
    fn test_patch_json_round_trip_is_a_plain_object() {
        let patch = ParameterPatch::new().with("defocus_u", 12000.0);
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"defocus_u":12000.0}"#);
    }
}
