use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplicingError {
    #[error("Image loading error: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Empty dataset: no images to train on")]
    EmptyDataset,

    #[error("No training data: extraction produced zero samples")]
    NoTrainingData,

    #[error("Model not trained and no persisted model available")]
    ModelNotTrained,

    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("No analyzable regions found in image")]
    NoRegionsFound,

    #[error("Dataset mismatch: {images} images but {labels} labels")]
    DatasetMismatch { images: usize, labels: usize },

    #[error("Invalid fold count: {folds} folds over {samples} samples")]
    InvalidFoldCount { folds: usize, samples: usize },
}

pub type Result<T> = std::result::Result<T, SplicingError>;
