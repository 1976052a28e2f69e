pub mod gge;
pub mod iic;

use image::RgbImage;
use ndarray::Array2;
use statrs::statistics::Statistics;

use crate::{
    error::{Result, SplicingError},
    image_utils::crop_region,
    region::Region,
};

pub use gge::GgeMapExtractor;
pub use iic::IicMapExtractor;

/// Per-pixel tamper-sensitivity map over a region, values in [0, 1].
pub type FeatureMap = Array2<f64>;

/// Ordered numeric summary of a region's two maps. GGE block first, then IIC,
/// each `SUMMARY_LEN` wide.
pub type FeatureVector = Vec<f64>;

pub const HISTOGRAM_BINS: usize = 8;

/// Six distribution moments plus the value histogram.
pub const SUMMARY_LEN: usize = 6 + HISTOGRAM_BINS;

/// Fixed dimensionality of every feature vector this extractor produces.
pub const FEATURE_DIM: usize = 2 * SUMMARY_LEN;

#[derive(Debug, Clone)]
pub struct FeatureMaps {
    pub gge: FeatureMap,
    pub iic: FeatureMap,
}

/// Reduces a map to a fixed-length summary: mean, std dev, skewness,
/// kurtosis, min, max, then a normalized histogram over [0, 1].
pub fn summarize(map: &FeatureMap) -> Result<Vec<f64>> {
    let values: Vec<f64> = map.iter().copied().collect();
    if values.is_empty() {
        return Err(SplicingError::InvalidRegion("empty feature map".into()));
    }

    let mean = values.iter().copied().mean();
    let std_dev = if values.len() > 1 {
        values.iter().copied().std_dev()
    } else {
        0.0
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let n = values.len() as f64;
    let (skewness, kurtosis) = if std_dev > 1e-12 {
        let m3 = values.iter().map(|v| ((v - mean) / std_dev).powi(3)).sum::<f64>() / n;
        let m4 = values.iter().map(|v| ((v - mean) / std_dev).powi(4)).sum::<f64>() / n;
        (m3, m4)
    } else {
        (0.0, 0.0)
    };

    let mut summary = Vec::with_capacity(SUMMARY_LEN);
    summary.extend([mean, std_dev, skewness, kurtosis, min, max]);

    let mut histogram = [0u64; HISTOGRAM_BINS];
    for &v in &values {
        let bin = ((v.clamp(0.0, 1.0)) * HISTOGRAM_BINS as f64) as usize;
        histogram[bin.min(HISTOGRAM_BINS - 1)] += 1;
    }
    summary.extend(histogram.iter().map(|&c| c as f64 / n));

    Ok(summary)
}

/// Computes both tamper-sensitivity maps for a region and reduces them to the
/// fixed-length feature vector. Pure function of the region's pixel data.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    gge: GgeMapExtractor,
    iic: IicMapExtractor,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute_maps(&self, image: &RgbImage, region: &Region) -> Result<FeatureMaps> {
        let crop = crop_region(image, region)?;

        Ok(FeatureMaps {
            gge: self.gge.compute(&crop),
            iic: self.iic.compute(&crop),
        })
    }

    pub fn extract(&self, image: &RgbImage, region: &Region) -> Result<FeatureVector> {
        let maps = self.compute_maps(image, region)?;

        let mut vector = Vec::with_capacity(FEATURE_DIM);
        vector.extend(summarize(&maps.gge)?);
        vector.extend(summarize(&maps.iic)?);

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionKind;
    use image::Rgb;
    use ndarray::array;

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 7 + y * 3) % 256) as u8;
            Rgb([v, v.wrapping_add(40), v.wrapping_add(90)])
        })
    }

    #[test]
    fn summary_has_fixed_length() {
        let map = array![[0.1, 0.4], [0.9, 0.2]];
        let summary = summarize(&map).unwrap();
        assert_eq!(summary.len(), SUMMARY_LEN);
    }

    #[test]
    fn histogram_bins_sum_to_one() {
        let map = array![[0.0, 0.25, 0.5], [0.75, 0.99, 1.0]];
        let summary = summarize(&map).unwrap();
        let hist_sum: f64 = summary[6..].iter().sum();
        assert!((hist_sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_map_has_zero_spread() {
        let map = FeatureMap::from_elem((4, 4), 0.5);
        let summary = summarize(&map).unwrap();
        assert!((summary[0] - 0.5).abs() < 1e-12); // mean
        assert!(summary[1].abs() < 1e-12); // std dev
        assert_eq!(summary[2], 0.0); // skewness
    }

    #[test]
    fn extract_produces_fixed_dimensionality() {
        let img = gradient_image(32, 32);
        let region = Region::new(4, 4, 16, 16, RegionKind::Generic);
        let vector = FeatureExtractor::new().extract(&img, &region).unwrap();
        assert_eq!(vector.len(), FEATURE_DIM);
    }

    #[test]
    fn extract_is_deterministic() {
        let img = gradient_image(32, 32);
        let region = Region::new(0, 0, 32, 32, RegionKind::Generic);
        let extractor = FeatureExtractor::new();

        let a = extractor.extract(&img, &region).unwrap();
        let b = extractor.extract(&img, &region).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_region_is_rejected() {
        let img = gradient_image(16, 16);
        let region = Region::new(0, 0, 0, 0, RegionKind::Generic);
        assert!(matches!(
            FeatureExtractor::new().extract(&img, &region),
            Err(SplicingError::InvalidRegion(_))
        ));
    }

    #[test]
    fn maps_match_region_size() {
        let img = gradient_image(40, 30);
        let region = Region::new(2, 3, 20, 10, RegionKind::Generic);
        let maps = FeatureExtractor::new().compute_maps(&img, &region).unwrap();
        assert_eq!(maps.gge.dim(), (10, 20));
        assert_eq!(maps.iic.dim(), (10, 20));
    }
}
