pub mod cache;
pub mod face;
pub mod region;

use image::DynamicImage;
use log::{debug, info, warn};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    DetectorConfig,
    error::{Result, SplicingError},
    evaluation::{self, EvaluationOutput},
    maps::{FEATURE_DIM, FeatureExtractor, FeatureVector},
    model::{ClassifierModel, Label, LabeledSample, TrainOutcome},
    region::{FaceBox, Region, RegionSelector, SelectionHints},
};

use cache::FeatureCache;

pub use face::FaceSplicingDetector;
pub use region::RegionSplicingDetector;

/// Serialized stand-in for "no valid detection". Kept bit-compatible with
/// the score files downstream consumers already parse.
pub const SENTINEL_SCORE: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    Face,
    Region,
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Face => "face",
            Variant::Region => "region",
        }
    }
}

/// Image-level splicing score. `NoDetection` is distinct from a score of
/// zero; it serializes as the sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub enum DetectionScore {
    Score(f64),
    NoDetection,
}

impl DetectionScore {
    /// The literal written at the serialization boundary.
    pub fn output_value(&self) -> f64 {
        match self {
            DetectionScore::Score(s) => *s,
            DetectionScore::NoDetection => SENTINEL_SCORE,
        }
    }
}

impl From<DetectionScore> for f64 {
    fn from(score: DetectionScore) -> f64 {
        score.output_value()
    }
}

impl From<f64> for DetectionScore {
    fn from(value: f64) -> DetectionScore {
        if value < 0.0 {
            DetectionScore::NoDetection
        } else {
            DetectionScore::Score(value)
        }
    }
}

/// Why a detection produced no score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    NoRegionsFound,
    ModelNotTrained,
}

#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub score: DetectionScore,
    pub regions: Vec<Region>,
    pub diagnostic: Option<Diagnostic>,
}

impl Detection {
    fn no_regions() -> Self {
        Self {
            score: DetectionScore::NoDetection,
            regions: Vec::new(),
            diagnostic: Some(Diagnostic::NoRegionsFound),
        }
    }

    fn not_trained() -> Self {
        Self {
            score: DetectionScore::NoDetection,
            regions: Vec::new(),
            diagnostic: Some(Diagnostic::ModelNotTrained),
        }
    }
}

/// Image-level combination rule: a single spliced region is sufficient
/// evidence, so the maximum per-region score wins.
pub fn combine_scores(scores: &[f64]) -> DetectionScore {
    scores
        .iter()
        .copied()
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
        .map(DetectionScore::Score)
        .unwrap_or(DetectionScore::NoDetection)
}

/// Shared train/detect/extract orchestration driven by both detector
/// variants. The variant only contributes its region selector.
pub(crate) struct Engine<S: RegionSelector> {
    variant: Variant,
    selector: S,
    extractor: FeatureExtractor,
    model: ClassifierModel,
    config: DetectorConfig,
    cache: Option<FeatureCache>,
    train_attempted: bool,
}

impl<S: RegionSelector + Clone + Send + Sync> Engine<S> {
    pub(crate) fn new(variant: Variant, selector: S, config: DetectorConfig) -> Self {
        let cache = config.cache_dir.as_ref().map(|dir| {
            FeatureCache::new(dir, variant.name(), &selector.fingerprint(), FEATURE_DIM)
        });

        Self {
            variant,
            selector,
            extractor: FeatureExtractor::new(),
            model: ClassifierModel::new(FEATURE_DIM),
            config,
            cache,
            train_attempted: false,
        }
    }

    pub(crate) fn fresh(&self) -> Self {
        Self::new(self.variant, self.selector.clone(), self.config.clone())
    }

    pub(crate) fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn model_path(&self) -> std::path::PathBuf {
        self.config
            .model_dir
            .join(format!("{}_model.json", self.variant.name()))
    }

    /// Feature vectors for every selectable region of one image. Degenerate
    /// regions are skipped with a warning, never zero-filled.
    fn extract_regions(
        &self,
        rgb: &image::RgbImage,
        hints: &SelectionHints,
    ) -> Result<Vec<FeatureVector>> {
        let regions = self.selector.select(rgb, hints)?;
        let mut vectors = Vec::with_capacity(regions.len());

        for region in &regions {
            match self.extractor.extract(rgb, region) {
                Ok(vector) => vectors.push(vector),
                Err(SplicingError::InvalidRegion(reason)) => {
                    warn!("skipping region: {reason}");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(vectors)
    }

    /// Cache-aware extraction for one training image. Recomputation is forced
    /// only when both extraction flags are set; otherwise the per-variant
    /// cache is consulted first and misses are recomputed and stored.
    fn image_features(&self, rgb: &image::RgbImage) -> Result<Vec<FeatureVector>> {
        let force_recompute = self.config.extract_maps && self.config.extract_features;

        if !force_recompute {
            if let Some(cache) = &self.cache {
                if let Some(hit) = cache.get(rgb) {
                    debug!("feature cache hit for {} variant", self.variant.name());
                    return Ok(hit);
                }
            }
        }

        let vectors = self.extract_regions(rgb, &SelectionHints::default())?;
        if let Some(cache) = &self.cache {
            cache.put(rgb, &vectors)?;
        }

        Ok(vectors)
    }

    pub(crate) fn train(
        &mut self,
        images: &[DynamicImage],
        labels: &[Label],
    ) -> Result<TrainOutcome> {
        if images.is_empty() {
            return Err(SplicingError::EmptyDataset);
        }
        if images.len() != labels.len() {
            return Err(SplicingError::DatasetMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }
        self.train_attempted = true;

        let rgb: Vec<image::RgbImage> = images.iter().map(|i| i.to_rgb8()).collect();
        let per_image: Vec<Vec<FeatureVector>> = rgb
            .par_iter()
            .map(|img| self.image_features(img))
            .collect::<Result<_>>()?;

        let mut samples = Vec::new();
        for (vectors, &label) in per_image.iter().zip(labels) {
            for vector in vectors {
                samples.push(LabeledSample {
                    features: vector.clone(),
                    label,
                });
            }
        }

        let outcome = self.model.train(&samples)?;
        match outcome {
            TrainOutcome::Trained { samples } => {
                if self.config.verbose {
                    info!(
                        "{} detector trained on {} samples from {} images",
                        self.variant.name(),
                        samples,
                        images.len()
                    );
                }
                self.model.save(self.model_path())?;
            }
            TrainOutcome::NoTrainingData => {
                warn!(
                    "{} detector: extraction produced no samples, model left untrained",
                    self.variant.name()
                );
            }
        }

        Ok(outcome)
    }

    pub(crate) fn detect(
        &mut self,
        image: &DynamicImage,
        faces: Option<&[FaceBox]>,
    ) -> Result<Detection> {
        // Lazy reload only covers the detect-without-train workflow. Once
        // this instance has attempted training, its own outcome is
        // authoritative: an untrained model never falls back to state
        // persisted by another instance (cross-validation folds in
        // particular must stay isolated).
        if !self.model.is_trained() && self.train_attempted {
            return Ok(Detection::not_trained());
        }
        if !self.model.is_trained() {
            match ClassifierModel::load(self.model_path(), FEATURE_DIM) {
                Ok(model) => {
                    debug!("loaded persisted {} model", self.variant.name());
                    self.model = model;
                }
                Err(SplicingError::DimensionMismatch { expected, actual }) => {
                    return Err(SplicingError::DimensionMismatch { expected, actual });
                }
                Err(e) => {
                    debug!("no usable persisted model: {e}");
                    return Ok(Detection::not_trained());
                }
            }
        }

        let rgb = image.to_rgb8();
        let hints = match faces {
            Some(list) => SelectionHints::with_faces(list.to_vec()),
            None => SelectionHints::default(),
        };

        let regions = self.selector.select(&rgb, &hints)?;
        let mut scored = Vec::with_capacity(regions.len());

        for region in regions {
            match self.extractor.extract(&rgb, &region) {
                Ok(vector) => {
                    let score = self.model.predict(&vector)?;
                    scored.push((region, score));
                }
                Err(SplicingError::InvalidRegion(reason)) => {
                    warn!("skipping region: {reason}");
                }
                Err(e) => return Err(e),
            }
        }

        if scored.is_empty() {
            return Ok(Detection::no_regions());
        }

        let per_region: Vec<f64> = scored.iter().map(|(_, s)| *s).collect();
        let score = combine_scores(&per_region);

        if self.config.verbose || self.config.display_result {
            info!(
                "{} detection score {:.4} over {} regions",
                self.variant.name(),
                score.output_value(),
                scored.len()
            );
        }

        Ok(Detection {
            score,
            regions: scored.into_iter().map(|(r, _)| r).collect(),
            diagnostic: None,
        })
    }

    /// Extraction-only path for diagnostics; independent of model state and
    /// of the training cache.
    pub(crate) fn extract_features(&self, image: &DynamicImage) -> Result<Vec<FeatureVector>> {
        self.extract_regions(&image.to_rgb8(), &SelectionHints::default())
    }
}

/// The contract both detector variants satisfy. Feature vectors are never
/// interchangeable across variants: each trains and persists its own model.
pub trait SplicingDetector: Sized {
    fn variant(&self) -> Variant;

    fn config(&self) -> &DetectorConfig;

    /// Untrained detector with the same configuration; used to isolate
    /// cross-validation folds.
    fn fresh(&self) -> Self;

    fn train(&mut self, images: &[DynamicImage], labels: &[Label]) -> Result<TrainOutcome>;

    fn detect(&mut self, image: &DynamicImage, faces: Option<&[FaceBox]>) -> Result<Detection>;

    fn extract_features(&self, image: &DynamicImage) -> Result<Vec<FeatureVector>>;

    fn evaluate(
        &mut self,
        images: &[DynamicImage],
        labels: &[Label],
    ) -> Result<EvaluationOutput> {
        if self.config().cross_validation {
            let folds = self.config().folds;
            Ok(EvaluationOutput::CrossValidated(evaluation::cross_validate(
                self, images, labels, folds,
            )?))
        } else {
            Ok(EvaluationOutput::Single(evaluation::evaluate_single(
                self, images, labels,
            )?))
        }
    }
}
