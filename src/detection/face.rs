use std::sync::Arc;

use image::DynamicImage;

use crate::{
    DetectorConfig,
    detection::{Detection, Engine, SplicingDetector, Variant},
    error::Result,
    maps::FeatureVector,
    model::{Label, TrainOutcome},
    region::{FaceBox, FaceDetector, FaceRegionSelector},
};

/// Splicing detector centered on human faces. Analyzes externally supplied
/// face boxes, or boxes from an optional live face-detection collaborator.
pub struct FaceSplicingDetector {
    engine: Engine<FaceRegionSelector>,
}

impl FaceSplicingDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            engine: Engine::new(Variant::Face, FaceRegionSelector::new(), config),
        }
    }

    /// Installs an external face detector, consulted whenever no explicit
    /// face list accompanies an image.
    pub fn with_face_detector(config: DetectorConfig, detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            engine: Engine::new(
                Variant::Face,
                FaceRegionSelector::new().with_detector(detector),
                config,
            ),
        }
    }
}

impl SplicingDetector for FaceSplicingDetector {
    fn variant(&self) -> Variant {
        Variant::Face
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{DetectionScore, Diagnostic};
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    struct CenterFace;

    impl FaceDetector for CenterFace {
        fn detect_faces(&self, _gray: &[u8], width: u32, height: u32) -> Vec<FaceBox> {
            vec![FaceBox::new(
                width as i64 / 4,
                height as i64 / 4,
                width / 2,
                height / 2,
            )]
        }
    }

    fn warm_face(seed: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(
            64,
            64,
            Rgb([200, 140u8.wrapping_add(seed), 80]),
        ))
    }

    fn spliced_face(seed: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            if x >= 16 && x < 48 && y >= 16 && y < 32 {
                Rgb([60, 90u8.wrapping_add(seed), 230])
            } else {
                Rgb([200, 140u8.wrapping_add(seed), 80])
            }
        }))
    }

    fn config(dir: &std::path::Path) -> DetectorConfig {
        DetectorConfig {
            model_dir: dir.to_path_buf(),
            ..DetectorConfig::default()
        }
    }

    fn trained_detector(dir: &std::path::Path) -> FaceSplicingDetector {
        let mut detector =
            FaceSplicingDetector::with_face_detector(config(dir), Arc::new(CenterFace));
        let images: Vec<DynamicImage> = (0..4)
            .map(warm_face)
            .chain((0..4).map(spliced_face))
            .collect();
        let labels: Vec<Label> = std::iter::repeat_n(Label::Authentic, 4)
            .chain(std::iter::repeat_n(Label::Spliced, 4))
            .collect();
        detector.train(&images, &labels).unwrap();
        detector
    }

    #[test]
    fn empty_faces_list_returns_sentinel_not_a_score() {
        let dir = tempdir().unwrap();
        let mut detector = trained_detector(dir.path());

        let detection = detector.detect(&warm_face(0), Some(&[])).unwrap();
        assert_eq!(detection.score, DetectionScore::NoDetection);
        assert_eq!(detection.diagnostic, Some(Diagnostic::NoRegionsFound));
        assert!(detection.regions.is_empty());
    }

    #[test]
    fn supplied_faces_are_used_for_detection() {
        let dir = tempdir().unwrap();
        let mut detector = trained_detector(dir.path());

        let faces = [FaceBox::new(8, 8, 48, 48)];
        let detection = detector.detect(&spliced_face(0), Some(&faces)).unwrap();
        assert!(matches!(detection.score, DetectionScore::Score(_)));
        assert_eq!(detection.regions.len(), 1);
    }

    #[test]
    fn untrained_detector_returns_sentinel() {
        let dir = tempdir().unwrap();
        let mut detector = FaceSplicingDetector::new(config(dir.path()));

        let faces = [FaceBox::new(8, 8, 16, 16)];
        let detection = detector.detect(&warm_face(0), Some(&faces)).unwrap();
        assert_eq!(detection.score, DetectionScore::NoDetection);
        assert_eq!(detection.diagnostic, Some(Diagnostic::ModelNotTrained));
    }

    #[test]
    fn live_detector_drives_training_and_detection() {
        let dir = tempdir().unwrap();
        let mut detector = trained_detector(dir.path());

        let spliced = detector.detect(&spliced_face(9), None).unwrap();
        let authentic = detector.detect(&warm_face(9), None).unwrap();
        assert!(spliced.score.output_value() > authentic.score.output_value());
    }
}
