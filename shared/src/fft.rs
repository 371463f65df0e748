//! Two-dimensional FFT helpers and frequency grids.
//!
//! Conventions follow numpy's `fftn`/`ifftn`: the forward transform is
//! unnormalized, the inverse carries the `1/N` factor, and the zero-frequency
//! coefficient sits at index `[0, 0]` (no shift).

use ndarray::{Array2, Array3, ArrayView2, Axis};
use num_complex::Complex64;
use rustfft::{FftDirection, FftPlanner};

/// Run a separable 2D transform in place, rows first then columns.
fn transform_2d(data: &mut Array2<Complex64>, direction: FftDirection) {
    let (rows, cols) = data.dim();
    if rows == 0 || cols == 0 {
        return;
    }

    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft(cols, direction);
    let col_fft = planner.plan_fft(rows, direction);

    // Lanes are not guaranteed contiguous, so each one goes through a scratch buffer
    let mut buffer = vec![Complex64::default(); cols];
    for mut row in data.rows_mut() {
        buffer.iter_mut().zip(row.iter()).for_each(|(b, v)| *b = *v);
        row_fft.process(&mut buffer);
        row.iter_mut().zip(buffer.iter()).for_each(|(v, b)| *v = *b);
    }

    let mut buffer = vec![Complex64::default(); rows];
    for mut column in data.columns_mut() {
        buffer
            .iter_mut()
            .zip(column.iter())
            .for_each(|(b, v)| *b = *v);
        col_fft.process(&mut buffer);
        column.iter_mut().zip(buffer.iter()).for_each(|(v, b)| *v = *b);
    }
}

/// Forward 2D FFT of a complex image.
pub fn fft2(image: &Array2<Complex64>) -> Array2<Complex64> {
    let mut spectrum = image.clone();
    transform_2d(&mut spectrum, FftDirection::Forward);
    spectrum
}

/// Forward 2D FFT of a real image.
pub fn fft2_real(image: &Array2<f64>) -> Array2<Complex64> {
    let mut spectrum = image.mapv(|v| Complex64::new(v, 0.0));
    transform_2d(&mut spectrum, FftDirection::Forward);
    spectrum
}

/// Inverse 2D FFT, normalized by `1/N`.
pub fn ifft2(spectrum: &Array2<Complex64>) -> Array2<Complex64> {
    let mut image = spectrum.clone();
    transform_2d(&mut image, FftDirection::Inverse);
    let norm = 1.0 / (image.len().max(1) as f64);
    image.mapv_inplace(|v| v * norm);
    image
}

/// Inverse 2D FFT keeping only the real part.
///
/// Exact for Hermitian spectra (spectra of real images) up to rounding.
pub fn ifft2_real(spectrum: &Array2<Complex64>) -> Array2<f64> {
    ifft2(spectrum).mapv(|v| v.re)
}

/// Sample frequencies for a signal of length `n`, in cycles per sample.
///
/// Matches `numpy.fft.fftfreq(n)`: `[0, 1, ..., ceil(n/2)-1, -floor(n/2), ..., -1] / n`.
pub fn fftfreq(n: usize) -> Vec<f64> {
    let positive = n.div_ceil(2);
    (0..n)
        .map(|i| {
            let k = if i < positive {
                i as f64
            } else {
                i as f64 - n as f64
            };
            k / n as f64
        })
        .collect()
}

/// Frequency coordinates of every coefficient of a 2D spectrum.
///
/// Stored as a `(rows, cols, 2)` array where `[.., .., 0]` is the frequency
/// along the row axis and `[.., .., 1]` along the column axis. Units are
/// whatever the grid was scaled to: cycles per pixel from [`fftfreqs`],
/// inverse length after [`FrequencyGrid::scaled`] by `1 / pixel_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    coords: Array3<f64>,
}

impl FrequencyGrid {
    /// Shape of the spectrum this grid describes.
    pub fn shape(&self) -> (usize, usize) {
        let dims = self.coords.dim();
        (dims.0, dims.1)
    }

    /// Row-axis frequency component.
    pub fn row_component(&self) -> ArrayView2<'_, f64> {
        self.coords.index_axis(Axis(2), 0)
    }

    /// Column-axis frequency component.
    pub fn col_component(&self) -> ArrayView2<'_, f64> {
        self.coords.index_axis(Axis(2), 1)
    }

    /// Return a copy with every frequency multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            coords: self.coords.mapv(|k| k * factor),
        }
    }

    /// Radial frequency magnitude `|k|` at every coefficient.
    pub fn radial(&self) -> Array2<f64> {
        self.map(|ky, kx| ky.hypot(kx))
    }

    /// Largest absolute frequency along either axis, Nyquist for even shapes.
    pub fn max_component(&self) -> f64 {
        self.coords.iter().fold(0.0, |m, k| m.max(k.abs()))
    }

    /// Evaluate `f(k_row, k_col)` at every coefficient.
    pub fn map<F>(&self, f: F) -> Array2<f64>
    where
        F: Fn(f64, f64) -> f64,
    {
        let (rows, cols) = self.shape();
        Array2::from_shape_fn((rows, cols), |(i, j)| {
            f(self.coords[[i, j, 0]], self.coords[[i, j, 1]])
        })
    }
}

/// Build the unshifted frequency grid for a spectrum of the given shape,
/// in cycles per pixel.
pub fn fftfreqs(shape: (usize, usize)) -> FrequencyGrid {
    let (rows, cols) = shape;
    let row_freqs = fftfreq(rows);
    let col_freqs = fftfreq(cols);
    let coords = Array3::from_shape_fn((rows, cols, 2), |(i, j, c)| {
        if c == 0 {
            row_freqs[i]
        } else {
            col_freqs[j]
        }
    });
    FrequencyGrid { coords }
}
