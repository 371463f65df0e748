//! Real-space masks applied to cropped images.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

use crate::errors::{ensure_non_negative, ensure_positive, SimulationError};
use crate::filters::cosine_edge;

/// Circular mask centered on the image, with a raised-cosine edge.
///
/// `radius` and `rolloff` are in pixels. The center is pixel
/// `(rows / 2, cols / 2)`, the same origin the specimen projects onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularMask {
    pub radius: f64,
    #[serde(default)]
    pub rolloff: f64,
}

impl CircularMask {
    pub fn new(radius: f64, rolloff: f64) -> Self {
        Self { radius, rolloff }
    }

    pub fn evaluate(&self, shape: (usize, usize)) -> Array2<f64> {
        let (cr, cc) = ((shape.0 / 2) as f64, (shape.1 / 2) as f64);
        Array2::from_shape_fn(shape, |(i, j)| {
            let r = (i as f64 - cr).hypot(j as f64 - cc);
            cosine_edge(r, self.radius, self.rolloff)
        })
    }
}

/// A real-space mask.
#[derive(Debug, Clone, PartialEq)]
pub enum Mask {
    Circular(CircularMask),
    /// Precomputed weights with the image's shape.
    Custom(Array2<f64>),
}

impl From<CircularMask> for Mask {
    fn from(mask: CircularMask) -> Self {
        Mask::Circular(mask)
    }
}

impl Mask {
    fn evaluate(&self, shape: (usize, usize)) -> Result<Array2<f64>, SimulationError> {
        match self {
            Mask::Circular(circle) => {
                ensure_positive("mask_radius", circle.radius)?;
                ensure_non_negative("mask_rolloff", circle.rolloff)?;
                Ok(circle.evaluate(shape))
            }
            Mask::Custom(weights) => {
                if weights.dim() != shape {
                    return Err(SimulationError::ShapeMismatch {
                        context: "custom mask",
                        expected: shape,
                        actual: weights.dim(),
                    });
                }
                Ok(weights.clone())
            }
        }
    }
}

/// Ordered masks over the cropped grid, folded into one weight array.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskChain {
    masks: Vec<Mask>,
    weights: Option<Array2<f64>>,
}

impl MaskChain {
    pub fn new(masks: Vec<Mask>, shape: (usize, usize)) -> Result<Self, SimulationError> {
        let mut weights: Option<Array2<f64>> = None;
        for mask in &masks {
            let next = mask.evaluate(shape)?;
            weights = Some(match weights {
                Some(acc) => acc * next,
                None => next,
            });
        }
        Ok(Self { masks, weights })
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Multiply a real-space image (real or complex valued) by every mask.
    pub fn apply<T>(&self, image: &Array2<T>) -> Result<Array2<T>, SimulationError>
    where
        T: Copy + Mul<f64, Output = T>,
    {
        let Some(weights) = &self.weights else {
            return Ok(image.clone());
        };
        if weights.dim() != image.dim() {
            return Err(SimulationError::ShapeMismatch {
                context: "mask input",
                expected: weights.dim(),
                actual: image.dim(),
            });
        }
        let mut masked = image.clone();
        masked.zip_mut_with(weights, |v, &w| *v = *v * w);
        Ok(masked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_circular_mask_profile() {
        let weights = CircularMask::new(4.0, 2.0).evaluate((16, 16));

        assert_eq!(weights[[8, 8]], 1.0);
        assert_eq!(weights[[8, 12]], 1.0);
        assert!(weights[[8, 13]] > 0.0 && weights[[8, 13]] < 1.0);
        assert_eq!(weights[[8, 14]], 0.0);
        assert_eq!(weights[[0, 0]], 0.0);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = MaskChain::new(Vec::new(), (3, 3)).unwrap();
        let image = Array2::from_elem((3, 3), 2.5);
        assert_eq!(chain.apply(&image).unwrap(), image);
    }

    #[test]
    fn test_masks_complex_images() {
        let chain = MaskChain::new(
            vec![
                Mask::Custom(Array2::from_elem((2, 2), 0.5)),
                CircularMask::new(10.0, 0.0).into(),
            ],
            (2, 2),
        )
        .unwrap();
        let image = Array2::from_elem((2, 2), Complex64::new(2.0, -4.0));
        let masked = chain.apply(&image).unwrap();
        assert!(masked.iter().all(|c| *c == Complex64::new(1.0, -2.0)));
    }

    #[test]
    fn test_shape_and_parameter_errors() {
        assert!(MaskChain::new(vec![Mask::Custom(Array2::ones((2, 3)))], (2, 2)).is_err());
        assert!(MaskChain::new(vec![CircularMask::new(0.0, 1.0).into()], (2, 2)).is_err());

        let chain = MaskChain::new(vec![CircularMask::new(1.0, 0.0).into()], (4, 4)).unwrap();
        assert!(matches!(
            chain.apply(&Array2::<f64>::zeros((5, 4))),
            Err(SimulationError::ShapeMismatch { .. })
        ));
    }
}
