use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SplicingError},
    maps::FeatureVector,
};

/// Scores at or above this threshold classify as spliced. The same boundary
/// rule is applied at train and evaluation time.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Authentic,
    Spliced,
}

impl Label {
    fn target(&self) -> f64 {
        match self {
            Label::Authentic => 0.0,
            Label::Spliced => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabeledSample {
    pub features: FeatureVector,
    pub label: Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    /// Model trained on this many samples.
    Trained { samples: usize },
    /// Empty sample set: the model was left untrained.
    NoTrainingData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrainedState {
    dimensionality: usize,
    weights: Vec<f64>,
    bias: f64,
    feature_means: Vec<f64>,
    feature_stds: Vec<f64>,
}

/// Binary logistic-regression classifier over feature vectors. Training is
/// fully deterministic: zero-initialized weights, fixed full-batch gradient
/// descent schedule, no RNG.
#[derive(Debug, Clone)]
pub struct ClassifierModel {
    dimensionality: usize,
    epochs: usize,
    learning_rate: f64,
    state: Option<TrainedState>,
}

impl ClassifierModel {
    pub fn new(dimensionality: usize) -> Self {
        Self {
            dimensionality,
            epochs: 500,
            learning_rate: 0.1,
            state: None,
        }
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    pub fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    pub fn train(&mut self, samples: &[LabeledSample]) -> Result<TrainOutcome> {
        if samples.is_empty() {
            warn!("train called with zero samples; model left untrained");
            return Ok(TrainOutcome::NoTrainingData);
        }

        for sample in samples {
            if sample.features.len() != self.dimensionality {
                return Err(SplicingError::DimensionMismatch {
                    expected: self.dimensionality,
                    actual: sample.features.len(),
                });
            }
        }

        let n = samples.len() as f64;
        let dim = self.dimensionality;

        let mut means = vec![0.0; dim];
        for sample in samples {
            for (m, &v) in means.iter_mut().zip(&sample.features) {
                *m += v / n;
            }
        }

        let mut stds = vec![0.0; dim];
        for sample in samples {
            for ((s, &m), &v) in stds.iter_mut().zip(&means).zip(&sample.features) {
                *s += (v - m) * (v - m) / n;
            }
        }
        for s in &mut stds {
            *s = s.sqrt();
            if *s < 1e-12 {
                *s = 1.0;
            }
        }

        let standardized: Vec<Vec<f64>> = samples
            .iter()
            .map(|sample| {
                sample
                    .features
                    .iter()
                    .zip(means.iter().zip(&stds))
                    .map(|(&v, (&m, &s))| (v - m) / s)
                    .collect()
            })
            .collect();

        let mut weights = vec![0.0; dim];
        let mut bias = 0.0;

        for _ in 0..self.epochs {
            let mut grad_w = vec![0.0; dim];
            let mut grad_b = 0.0;

            for (features, sample) in standardized.iter().zip(samples) {
                let z = bias
                    + weights
                        .iter()
                        .zip(features)
                        .map(|(&w, &v)| w * v)
                        .sum::<f64>();
                let error = sigmoid(z) - sample.label.target();

                for (g, &v) in grad_w.iter_mut().zip(features) {
                    *g += error * v / n;
                }
                grad_b += error / n;
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= self.learning_rate * g;
            }
            bias -= self.learning_rate * grad_b;
        }

        info!("trained classifier on {} samples ({} dims)", samples.len(), dim);
        self.state = Some(TrainedState {
            dimensionality: dim,
            weights,
            bias,
            feature_means: means,
            feature_stds: stds,
        });

        Ok(TrainOutcome::Trained { samples: samples.len() })
    }

    /// Splicing score in [0, 1], monotone in the decision function output.
    pub fn predict(&self, vector: &[f64]) -> Result<f64> {
        let state = self.state.as_ref().ok_or(SplicingError::ModelNotTrained)?;

        if vector.len() != state.dimensionality {
            return Err(SplicingError::DimensionMismatch {
                expected: state.dimensionality,
                actual: vector.len(),
            });
        }

        let z = state.bias
            + state
                .weights
                .iter()
                .zip(vector)
                .zip(state.feature_means.iter().zip(&state.feature_stds))
                .map(|((&w, &v), (&m, &s))| w * (v - m) / s)
                .sum::<f64>();

        Ok(sigmoid(z))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let state = self.state.as_ref().ok_or(SplicingError::ModelNotTrained)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(path, json)?;

        Ok(())
    }

    /// Loads persisted model state, failing fast when the stored
    /// dimensionality disagrees with the expected one.
    pub fn load<P: AsRef<Path>>(path: P, expected_dimensionality: usize) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let state: TrainedState = serde_json::from_str(&json)?;

        if state.dimensionality != expected_dimensionality {
            return Err(SplicingError::DimensionMismatch {
                expected: expected_dimensionality,
                actual: state.dimensionality,
            });
        }

        Ok(Self {
            dimensionality: expected_dimensionality,
            epochs: 500,
            learning_rate: 0.1,
            state: Some(state),
        })
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
