use image::{GrayImage, Luma};
use ndarray::Array2;
use std::path::Path;

/// Converts a real-valued image to an 8-bit GrayImage
///
/// Values are linearly stretched so the minimum maps to 0 and the maximum to
/// 255. A constant image maps to mid-gray. Array indices [y, x] map to pixel
/// coordinates (x, y); array dimensions are (height, width) while image
/// dimensions are (width, height).
///
/// # Arguments
/// * `arr` - Real-space image
///
/// # Returns
/// * A new GrayImage with the stretched values
pub fn array2_to_gray_image(arr: &Array2<f64>) -> GrayImage {
    let (height, width) = arr.dim();

    let (min, max) = arr
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    let mut img = GrayImage::new(width as u32, height as u32);
    for y in 0..height {
        for x in 0..width {
            let level = if range > 0.0 && range.is_finite() {
                ((arr[[y, x]] - min) / range * 255.0).round() as u8
            } else {
                128
            };
            img.put_pixel(x as u32, y as u32, Luma([level]));
        }
    }

    img
}

/// Stretch `arr` to 8 bits and write it as a PNG.
pub fn save_png(arr: &Array2<f64>, path: &Path) -> image::ImageResult<()> {
    log::debug!("Writing {}x{} PNG to {}", arr.ncols(), arr.nrows(), path.display());
    array2_to_gray_image(arr).save(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretch_to_full_range() {
        let arr = Array2::from_shape_fn((2, 3), |(i, j)| (i * 3 + j) as f64);
        let img = array2_to_gray_image(&arr);

        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(2, 1)[0], 255);
    }

    #[test]
    fn test_constant_image_is_mid_gray() {
        let img = array2_to_gray_image(&Array2::from_elem((4, 4), 7.0));
        assert!(img.pixels().all(|p| p[0] == 128));
    }

    #[test]
    fn test_save_png_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        save_png(&Array2::from_elem((4, 4), 1.0), &path).unwrap();
        assert!(path.exists());
    }
}
