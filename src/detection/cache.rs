use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use log::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::{error::Result, maps::FeatureVector};

/// On-disk cache of extracted feature vectors, keyed by image content.
/// Partitioned per detector variant and per extraction configuration — the
/// selector fingerprint and feature dimensionality — so a change to either
/// never reuses stale vectors.
pub struct FeatureCache {
    dir: PathBuf,
}

impl FeatureCache {
    pub fn new<P: AsRef<Path>>(
        root: P,
        variant: &str,
        selector_fingerprint: &str,
        feature_dim: usize,
    ) -> Self {
        Self {
            dir: root
                .as_ref()
                .join(variant)
                .join(format!("{selector_fingerprint}-dim{feature_dim}")),
        }
    }

    fn entry_path(&self, image: &RgbImage) -> PathBuf {
        let mut hasher_input = Vec::with_capacity(image.as_raw().len() + 8);
        hasher_input.extend_from_slice(&image.width().to_le_bytes());
        hasher_input.extend_from_slice(&image.height().to_le_bytes());
        hasher_input.extend_from_slice(image.as_raw());

        self.dir.join(format!("{:016x}.json", xxh3_64(&hasher_input)))
    }

    /// Cached vectors for this image, or `None` on miss or unreadable entry.
    pub fn get(&self, image: &RgbImage) -> Option<Vec<FeatureVector>> {
        let path = self.entry_path(image);
        let json = fs::read_to_string(&path).ok()?;

        match serde_json::from_str(&json) {
            Ok(vectors) => Some(vectors),
            Err(e) => {
                debug!("discarding unreadable cache entry {}: {e}", path.display());
                None
            }
        }
    }

    pub fn put(&self, image: &RgbImage, vectors: &[FeatureVector]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(vectors)?;
        fs::write(self.entry_path(image), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::tempdir;

    fn image(seed: u8) -> RgbImage {
        RgbImage::from_pixel(8, 8, Rgb([seed, seed, seed]))
    }

    #[test]
    fn round_trip_returns_stored_vectors() {
        let dir = tempdir().unwrap();
        let cache = FeatureCache::new(dir.path(), "region", "grid4x4m8", 28);
        let vectors = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];

        cache.put(&image(10), &vectors).unwrap();
        assert_eq!(cache.get(&image(10)), Some(vectors));
    }

    #[test]
    fn different_images_miss() {
        let dir = tempdir().unwrap();
        let cache = FeatureCache::new(dir.path(), "region", "grid4x4m8", 28);

        cache.put(&image(10), &[vec![1.0]]).unwrap();
        assert!(cache.get(&image(11)).is_none());
    }

    #[test]
    fn variants_are_partitioned() {
        let dir = tempdir().unwrap();
        let face = FeatureCache::new(dir.path(), "face", "faces", 28);
        let region = FeatureCache::new(dir.path(), "region", "grid4x4m8", 28);

        face.put(&image(10), &[vec![1.0]]).unwrap();
        assert!(region.get(&image(10)).is_none());
    }

    #[test]
    fn selector_configurations_are_partitioned() {
        let dir = tempdir().unwrap();
        let coarse = FeatureCache::new(dir.path(), "region", "grid2x2m8", 28);
        let fine = FeatureCache::new(dir.path(), "region", "grid4x4m8", 28);

        coarse.put(&image(10), &[vec![1.0]]).unwrap();
        assert!(fine.get(&image(10)).is_none());
    }

    #[test]
    fn feature_dimensionalities_are_partitioned() {
        let dir = tempdir().unwrap();
        let a = FeatureCache::new(dir.path(), "region", "grid4x4m8", 28);
        let b = FeatureCache::new(dir.path(), "region", "grid4x4m8", 14);

        a.put(&image(10), &[vec![1.0]]).unwrap();
        assert!(b.get(&image(10)).is_none());
    }
}
