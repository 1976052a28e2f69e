use image::RgbImage;
use ndarray::Array2;

use crate::maps::FeatureMap;

/// Illuminant-inconsistency tamper-sensitivity map. A gray-world estimate of
/// the region's illuminant is computed over usable pixels, then every pixel
/// is scored by the angular deviation of its chromaticity from that
/// estimate, normalized to [0, 1]. Content spliced in from a scene with a
/// different illuminant deviates systematically.
#[derive(Debug, Clone)]
pub struct IicMapExtractor {
    saturation_threshold: u8,
    darkness_threshold: u32,
}

impl IicMapExtractor {
    pub fn new() -> Self {
        Self {
            saturation_threshold: 250,
            darkness_threshold: 30,
        }
    }

    /// Saturated and near-dark pixels carry no usable chromaticity and are
    /// excluded from the illuminant estimate.
    fn is_usable(&self, pixel: &[u8; 3]) -> bool {
        let saturated = pixel.iter().any(|&c| c >= self.saturation_threshold);
        let dark = pixel.iter().map(|&c| c as u32).sum::<u32>() < self.darkness_threshold;
        !saturated && !dark
    }

    fn estimate_illuminant(&self, region_pixels: &RgbImage) -> [f64; 3] {
        let mut sum = [0.0f64; 3];
        let mut count = 0u64;

        for pixel in region_pixels.pixels() {
            if self.is_usable(&pixel.0) {
                for c in 0..3 {
                    sum[c] += pixel[c] as f64;
                }
                count += 1;
            }
        }

        // A fully masked region falls back to the plain mean so the map
        // stays defined.
        if count == 0 {
            for pixel in region_pixels.pixels() {
                for c in 0..3 {
                    sum[c] += pixel[c] as f64;
                }
            }
        }

        let norm = (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]).sqrt();
        if norm < 1e-12 {
            // Black region: neutral illuminant.
            let w = 1.0 / 3.0f64.sqrt();
            return [w, w, w];
        }

        [sum[0] / norm, sum[1] / norm, sum[2] / norm]
    }

    pub fn compute(&self, region_pixels: &RgbImage) -> FeatureMap {
        let (width, height) = region_pixels.dimensions();
        let illuminant = self.estimate_illuminant(region_pixels);
        let mut map = Array2::zeros((height as usize, width as usize));

        for (x, y, pixel) in region_pixels.enumerate_pixels() {
            let v = [pixel[0] as f64, pixel[1] as f64, pixel[2] as f64];
            let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            if norm < 1e-12 {
                continue;
            }

            let cos = (v[0] * illuminant[0] + v[1] * illuminant[1] + v[2] * illuminant[2]) / norm;
            let angle = cos.clamp(-1.0, 1.0).acos();
            map[[y as usize, x as usize]] =
                (angle / std::f64::consts::FRAC_PI_2).clamp(0.0, 1.0);
        }

        map
    }
}

impl Default for IicMapExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn uniform_region_is_consistent() {
        let img = RgbImage::from_pixel(16, 16, Rgb([180, 120, 60]));
        let map = IicMapExtractor::new().compute(&img);
        assert!(map.iter().all(|&v| v < 1e-6));
    }

    #[test]
    fn off_illuminant_patch_stands_out() {
        // Warm background with a cold patch pasted in.
        let img = RgbImage::from_fn(20, 20, |x, y| {
            if x < 5 && y < 5 { Rgb([40, 80, 220]) } else { Rgb([220, 140, 60]) }
        });
        let map = IicMapExtractor::new().compute(&img);
        assert!(map[[2, 2]] > map[[10, 10]]);
        assert!(map[[2, 2]] > 0.1);
    }

    #[test]
    fn saturated_pixels_excluded_from_estimate() {
        // Estimate comes from the unsaturated majority, so those pixels
        // score near zero even with a blown-out corner present.
        let img = RgbImage::from_fn(16, 16, |x, y| {
            if x < 2 && y < 2 { Rgb([255, 255, 255]) } else { Rgb([200, 100, 50]) }
        });
        let map = IicMapExtractor::new().compute(&img);
        assert!(map[[10, 10]] < 1e-6);
    }

    #[test]
    fn black_region_yields_flat_map() {
        let img = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let map = IicMapExtractor::new().compute(&img);
        assert!(map.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let img = RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
        });
        let map = IicMapExtractor::new().compute(&img);
        assert!(map.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
