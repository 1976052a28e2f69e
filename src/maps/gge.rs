use image::RgbImage;
use ndarray::Array2;

use crate::{
    image_utils::{gray_to_array, rgb_to_gray, sobel_x, sobel_y},
    maps::FeatureMap,
};

/// Largest magnitude a 3x3 Sobel pair can report on 8-bit luminance.
const MAX_SOBEL_MAGNITUDE: f64 = 1442.5;

/// Gradient/geometry tamper-sensitivity map: normalized Sobel gradient
/// magnitude of the region's luminance. Spliced-in content tends to leave
/// geometric seams and gradient discontinuities that stand out in the
/// map's value distribution.
#[derive(Debug, Clone, Default)]
pub struct GgeMapExtractor;

impl GgeMapExtractor {
    pub fn compute(&self, region_pixels: &RgbImage) -> FeatureMap {
        let gray = gray_to_array(&rgb_to_gray(region_pixels));
        let (height, width) = gray.dim();
        let mut map = Array2::zeros((height, width));

        if height < 3 || width < 3 {
            // Too small for the kernel; a flat map is still well-defined.
            return map;
        }

        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let gx = sobel_x(&gray, y, x);
                let gy = sobel_y(&gray, y, x);
                let magnitude = (gx * gx + gy * gy).sqrt();
                map[[y, x]] = (magnitude / MAX_SOBEL_MAGNITUDE).min(1.0);
            }
        }

        map
    }
}
