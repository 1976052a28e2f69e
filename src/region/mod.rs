pub mod face;
pub mod grid;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SplicingError};

pub use face::{FaceBox, FaceDetector, FaceRegionSelector};
pub use grid::GridRegionSelector;

/// Where a region came from. Feature vectors from the two kinds are never
/// interchangeable: each detector variant trains its own model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionKind {
    Face,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub kind: RegionKind,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32, kind: RegionKind) -> Self {
        Self { x, y, width, height, kind }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn validate(&self, image_width: u32, image_height: u32) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SplicingError::InvalidRegion(format!(
                "zero-area region at ({}, {})",
                self.x, self.y
            )));
        }
        if self.x as u64 + self.width as u64 > image_width as u64
            || self.y as u64 + self.height as u64 > image_height as u64
        {
            return Err(SplicingError::InvalidRegion(format!(
                "region {}x{} at ({}, {}) exceeds image bounds {}x{}",
                self.width, self.height, self.x, self.y, image_width, image_height
            )));
        }
        Ok(())
    }
}

/// Hints handed to a selector alongside the image. Only the face variant
/// consumes them today.
#[derive(Debug, Clone, Default)]
pub struct SelectionHints {
    pub faces: Option<Vec<FaceBox>>,
}

impl SelectionHints {
    pub fn with_faces(faces: Vec<FaceBox>) -> Self {
        Self { faces: Some(faces) }
    }
}

/// Yields the sub-regions of an image to analyze. The returned order must be
/// stable for a given image + hints: scores downstream depend on it.
pub trait RegionSelector {
    fn select(&self, image: &RgbImage, hints: &SelectionHints) -> Result<Vec<Region>>;

    /// Stable identifier of this selector's configuration. Cached extraction
    /// results are partitioned by it, so two selectors that can produce
    /// different regions must report different fingerprints.
    fn fingerprint(&self) -> String;
}
