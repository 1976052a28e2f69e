use image::DynamicImage;
use log::info;
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::{
    detection::{DetectionScore, SplicingDetector},
    error::{Result, SplicingError},
    model::{DECISION_THRESHOLD, Label},
};

/// Metrics from one train/detect pass. Images that produced no detection
/// (sentinel score) are counted as skipped and excluded from the metrics.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub scores: Vec<DetectionScore>,
    pub evaluated: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std_dev: f64,
}

fn summarize_metric(values: &[f64]) -> MetricSummary {
    let mean = values.iter().copied().mean();
    let std_dev = if values.len() > 1 {
        values.iter().copied().std_dev()
    } else {
        0.0
    };
    MetricSummary { mean, std_dev }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossValidationReport {
    pub folds: Vec<EvaluationReport>,
    pub accuracy: MetricSummary,
    pub precision: MetricSummary,
    pub recall: MetricSummary,
}

#[derive(Debug, Clone, Serialize)]
pub enum EvaluationOutput {
    Single(EvaluationReport),
    CrossValidated(CrossValidationReport),
}

/// Classification metrics for detection scores against ground truth, using
/// the same decision boundary the classifier trains against.
pub fn metrics_from(scores: &[DetectionScore], labels: &[Label]) -> EvaluationReport {
    let mut correct = 0usize;
    let mut true_positive = 0usize;
    let mut predicted_positive = 0usize;
    let mut actual_positive = 0usize;
    let mut evaluated = 0usize;
    let mut skipped = 0usize;

    for (score, label) in scores.iter().zip(labels) {
        let value = match score {
            DetectionScore::Score(v) => *v,
            DetectionScore::NoDetection => {
                skipped += 1;
                continue;
            }
        };
        evaluated += 1;

        let predicted_spliced = value >= DECISION_THRESHOLD;
        let is_spliced = *label == Label::Spliced;

        if predicted_spliced == is_spliced {
            correct += 1;
        }
        if predicted_spliced {
            predicted_positive += 1;
            if is_spliced {
                true_positive += 1;
            }
        }
        if is_spliced {
            actual_positive += 1;
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    EvaluationReport {
        accuracy: ratio(correct, evaluated),
        precision: ratio(true_positive, predicted_positive),
        recall: ratio(true_positive, actual_positive),
        scores: scores.to_vec(),
        evaluated,
        skipped,
    }
}

fn validate_dataset(images: &[DynamicImage], labels: &[Label]) -> Result<()> {
    if images.is_empty() {
        return Err(SplicingError::EmptyDataset);
    }
    if images.len() != labels.len() {
        return Err(SplicingError::DatasetMismatch {
            images: images.len(),
            labels: labels.len(),
        });
    }
    Ok(())
}

/// Single train/detect pass over the labeled set.
pub fn evaluate_single<D: SplicingDetector>(
    detector: &mut D,
    images: &[DynamicImage],
    labels: &[Label],
) -> Result<EvaluationReport> {
    validate_dataset(images, labels)?;

    detector.train(images, labels)?;

    let mut scores = Vec::with_capacity(images.len());
    for image in images {
        scores.push(detector.detect(image, None)?.score);
    }

    let report = metrics_from(&scores, labels);
    info!(
        "evaluation: accuracy {:.3}, precision {:.3}, recall {:.3} ({} evaluated, {} skipped)",
        report.accuracy, report.precision, report.recall, report.evaluated, report.skipped
    );

    Ok(report)
}

/// Deterministic contiguous partition of `n` samples into `k` disjoint folds
/// of size ⌊n/k⌋ or ⌈n/k⌉, covering every index exactly once.
pub fn fold_partition(n: usize, k: usize) -> Vec<Vec<usize>> {
    let base = n / k;
    let remainder = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;

    for fold in 0..k {
        let size = base + usize::from(fold < remainder);
        folds.push((start..start + size).collect());
        start += size;
    }

    folds
}

/// K-fold cross-validation. Each fold trains a fresh detector instance on the
/// other k−1 folds and evaluates on the held-out fold, so no trained state
/// leaks between folds.
pub fn cross_validate<D: SplicingDetector>(
    detector: &D,
    images: &[DynamicImage],
    labels: &[Label],
    k: usize,
) -> Result<CrossValidationReport> {
    validate_dataset(images, labels)?;
    if k < 2 || k > images.len() {
        return Err(SplicingError::InvalidFoldCount {
            folds: k,
            samples: images.len(),
        });
    }

    let folds = fold_partition(images.len(), k);
    let mut reports = Vec::with_capacity(k);

    for (index, held_out) in folds.iter().enumerate() {
        let mut train_images = Vec::with_capacity(images.len() - held_out.len());
        let mut train_labels = Vec::with_capacity(labels.len() - held_out.len());
        for (i, (image, label)) in images.iter().zip(labels).enumerate() {
            if !held_out.contains(&i) {
                train_images.push(image.clone());
                train_labels.push(*label);
            }
        }

        let mut fold_detector = detector.fresh();
        fold_detector.train(&train_images, &train_labels)?;

        let mut scores = Vec::with_capacity(held_out.len());
        let mut fold_labels = Vec::with_capacity(held_out.len());
        for &i in held_out {
            scores.push(fold_detector.detect(&images[i], None)?.score);
            fold_labels.push(labels[i]);
        }

        let report = metrics_from(&scores, &fold_labels);
        info!(
            "fold {}/{}: accuracy {:.3}, precision {:.3}, recall {:.3}",
            index + 1,
            k,
            report.accuracy,
            report.precision,
            report.recall
        );
        reports.push(report);
    }

    let accuracy = summarize_metric(&reports.iter().map(|r| r.accuracy).collect::<Vec<_>>());
    let precision = summarize_metric(&reports.iter().map(|r| r.precision).collect::<Vec<_>>());
    let recall = summarize_metric(&reports.iter().map(|r| r.recall).collect::<Vec<_>>());

    Ok(CrossValidationReport {
        folds: reports,
        accuracy,
        precision,
        recall,
    })
}
