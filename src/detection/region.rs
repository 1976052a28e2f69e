use image::DynamicImage;

use crate::{
    DetectorConfig,
    detection::{Detection, Engine, SplicingDetector, Variant},
    error::Result,
    maps::FeatureVector,
    model::{Label, TrainOutcome},
    region::{FaceBox, GridRegionSelector},
};

/// Splicing detector over generic image regions: the image is tiled with a
/// fixed grid and every tile is analyzed independently of face content.
pub struct RegionSplicingDetector {
    engine: Engine<GridRegionSelector>,
}

impl RegionSplicingDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_grid(config, GridRegionSelector::default())
    }

    pub fn with_grid(config: DetectorConfig, grid: GridRegionSelector) -> Self {
        Self {
            engine: Engine::new(Variant::Region, grid, config),
        }
    }
}

impl SplicingDetector for RegionSplicingDetector {
    fn variant(&self) -> Variant {
        Variant::Region
    }

    fn config(&self) -> &DetectorConfig {
        self.engine.config()
    }

    fn fresh(&self) -> Self {
        Self {
            engine: self.engine.fresh(),
        }
    }

    fn train(&mut self, images: &[DynamicImage], labels: &[Label]) -> Result<TrainOutcome> {
        self.engine.train(images, labels)
    }

    fn detect(&mut self, image: &DynamicImage, faces: Option<&[FaceBox]>) -> Result<Detection> {
        self.engine.detect(image, faces)
    }

    fn extract_features(&self, image: &DynamicImage) -> Result<Vec<FeatureVector>> {
        self.engine.extract_features(image)
    }
}
