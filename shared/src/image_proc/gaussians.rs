//! Rasterize isotropic 2D Gaussians onto a pixel grid.

use ndarray::Array2;
use std::f64::consts::PI;

use crate::boundaries::ArrayError;

/// Sum of normalized isotropic Gaussians sampled at pixel centers.
///
/// Pixel `(i, j)` sits at physical position
/// `((i - rows/2) * pixel_size, (j - cols/2) * pixel_size)`, so the origin is
/// the pixel that [`crate::crop`] keeps at the center of any smaller shape.
/// Each Gaussian integrates to its weight (sampled value times pixel area).
///
/// # Arguments
/// * `shape` - Output (rows, cols)
/// * `pixel_size` - Physical size of one pixel
/// * `centers` - Gaussian centers as (row, col) physical coordinates
/// * `weights` - Integrated weight of each Gaussian
/// * `sigma` - Shared standard deviation in physical units
pub fn rasterize_gaussians(
    shape: (usize, usize),
    pixel_size: f64,
    centers: &[(f64, f64)],
    weights: &[f64],
    sigma: f64,
) -> Result<Array2<f64>, ArrayError> {
    if centers.len() != weights.len() {
        return Err(ArrayError::LengthMismatch(centers.len(), weights.len()));
    }
    let (rows, cols) = shape;
    let row_coords: Vec<f64> = (0..rows)
        .map(|i| (i as f64 - (rows / 2) as f64) * pixel_size)
        .collect();
    let col_coords: Vec<f64> = (0..cols)
        .map(|j| (j as f64 - (cols / 2) as f64) * pixel_size)
        .collect();

    let inv_two_var = 1.0 / (2.0 * sigma * sigma);
    let norm = pixel_size * pixel_size / (2.0 * PI * sigma * sigma);

    let mut image = Array2::<f64>::zeros(shape);
    // The profile is separable, so each Gaussian is an outer product of two 1D profiles
    for (&(cy, cx), &weight) in centers.iter().zip(weights.iter()) {
        let gy: Vec<f64> = row_coords
            .iter()
            .map(|y| (-(y - cy).powi(2) * inv_two_var).exp())
            .collect();
        let gx: Vec<f64> = col_coords
            .iter()
            .map(|x| (-(x - cx).powi(2) * inv_two_var).exp())
            .collect();
        let amplitude = weight * norm;
        for (mut row, &py) in image.rows_mut().into_iter().zip(gy.iter()) {
            if py == 0.0 {
                continue;
            }
            row.iter_mut()
                .zip(gx.iter())
                .for_each(|(v, &px)| *v += amplitude * py * px);
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_integrates_to_weight() {
        let image = rasterize_gaussians((64, 64), 0.5, &[(0.0, 0.0)], &[3.0], 2.0).unwrap();
        assert_relative_eq!(image.sum(), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gaussian_peak_at_center_pixel() {
        let image = rasterize_gaussians((33, 32), 1.0, &[(0.0, 0.0)], &[1.0], 1.5).unwrap();
        let (peak, _) = image
            .indexed_iter()
            .fold(((0, 0), f64::MIN), |best, (idx, &v)| {
                if v > best.1 {
                    (idx, v)
                } else {
                    best
                }
            });
        assert_eq!(peak, (16, 16));
    }

    #[test]
    fn test_offset_gaussian_moves_peak() {
        let image = rasterize_gaussians((32, 32), 1.0, &[(3.0, -2.0)], &[1.0], 1.0).unwrap();
        assert!(image[[19, 14]] > image[[16, 16]]);
    }

    #[test]
    fn test_length_mismatch() {
        let result = rasterize_gaussians((8, 8), 1.0, &[(0.0, 0.0)], &[1.0, 2.0], 1.0);
        assert_eq!(result, Err(ArrayError::LengthMismatch(1, 2)));
    }
}
