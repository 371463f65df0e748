//! Centered crop and pad for 2D arrays.
//!
//! Both operations place the smaller array at offset `(big - small) / 2` on
//! each axis, so `crop(pad(x)) == x` exactly.

use ndarray::{s, Array2};
use thiserror::Error;

/// Errors raised by the array helpers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArrayError {
    #[error("Shape mismatch: expected {expected:?}, found {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Cannot crop {from:?} to the larger shape {to:?}")]
    CropTooLarge {
        from: (usize, usize),
        to: (usize, usize),
    },

    #[error("Cannot pad {from:?} to the smaller shape {to:?}")]
    PadTooSmall {
        from: (usize, usize),
        to: (usize, usize),
    },

    #[error("Input slices must have the same length ({0} != {1})")]
    LengthMismatch(usize, usize),
}

/// How to fill the border created by [`pad`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadMode<T> {
    /// Fill with a constant value.
    Constant(T),
    /// Repeat the nearest edge pixel.
    Edge,
}

fn offset(big: (usize, usize), small: (usize, usize)) -> (usize, usize) {
    ((big.0 - small.0) / 2, (big.1 - small.1) / 2)
}

/// Crop the center `shape` region out of `image`.
pub fn crop<T: Clone>(image: &Array2<T>, shape: (usize, usize)) -> Result<Array2<T>, ArrayError> {
    let from = image.dim();
    if shape.0 > from.0 || shape.1 > from.1 {
        return Err(ArrayError::CropTooLarge { from, to: shape });
    }
    let (r0, c0) = offset(from, shape);
    Ok(image
        .slice(s![r0..r0 + shape.0, c0..c0 + shape.1])
        .to_owned())
}

/// Pad `image` out to `shape`, keeping it centered.
pub fn pad<T: Clone>(
    image: &Array2<T>,
    shape: (usize, usize),
    mode: PadMode<T>,
) -> Result<Array2<T>, ArrayError> {
    let from = image.dim();
    if shape.0 < from.0 || shape.1 < from.1 {
        return Err(ArrayError::PadTooSmall { from, to: shape });
    }
    if from.0 == 0 || from.1 == 0 {
        return Err(ArrayError::ShapeMismatch {
            expected: shape,
            actual: from,
        });
    }
    let (r0, c0) = offset(shape, from);

    let padded = match mode {
        PadMode::Constant(value) => {
            let mut padded = Array2::from_elem(shape, value);
            padded
                .slice_mut(s![r0..r0 + from.0, c0..c0 + from.1])
                .assign(image);
            padded
        }
        PadMode::Edge => Array2::from_shape_fn(shape, |(i, j)| {
            let si = i.saturating_sub(r0).min(from.0 - 1);
            let sj = j.saturating_sub(c0).min(from.1 - 1);
            image[[si, sj]].clone()
        }),
    };
    Ok(padded)
}
