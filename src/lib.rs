use std::path::PathBuf;

pub mod detection;
pub mod error;
pub mod evaluation;
pub mod image_utils;
pub mod maps;
pub mod model;
pub mod region;

pub use detection::{
    Detection, DetectionScore, Diagnostic, FaceSplicingDetector, RegionSplicingDetector,
    SplicingDetector, Variant,
};
pub use error::{Result, SplicingError};
pub use evaluation::{CrossValidationReport, EvaluationOutput, EvaluationReport};
pub use maps::{FEATURE_DIM, FeatureExtractor, FeatureVector};
pub use model::{ClassifierModel, Label, LabeledSample, TrainOutcome};
pub use region::{FaceBox, FaceDetector, Region, RegionKind};

/// Immutable per-detector configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Recompute tamper-sensitivity maps instead of reusing cached results.
    pub extract_maps: bool,
    /// Recompute feature vectors instead of reusing cached results.
    pub extract_features: bool,
    /// Evaluate with k-fold cross-validation instead of a single pass.
    pub cross_validation: bool,
    pub folds: usize,
    pub verbose: bool,
    pub display_result: bool,
    /// Where trained models are persisted, keyed by detector variant.
    pub model_dir: PathBuf,
    /// Feature cache location; caching is disabled when unset.
    pub cache_dir: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            extract_maps: true,
            extract_features: true,
            cross_validation: false,
            folds: 5,
            verbose: false,
            display_result: false,
            model_dir: PathBuf::from("models"),
            cache_dir: None,
        }
    }
}

impl DetectorConfig {
    pub fn with_model_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.model_dir = dir.into();
        self
    }

    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_cross_validation(mut self, folds: usize) -> Self {
        self.cross_validation = true;
        self.folds = folds;
        self
    }
}
