use std::sync::Arc;

use image::RgbImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    image_utils::rgb_to_gray,
    region::{Region, RegionKind, RegionSelector, SelectionHints},
};

/// Bounding box of a detected face, as reported by an external detector or a
/// precomputed faces list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl FaceBox {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Clamps the box to the image bounds. Returns `None` when nothing of the
    /// box lies inside the image.
    fn clamp(&self, image_width: u32, image_height: u32) -> Option<Region> {
        let x0 = self.x.max(0) as u32;
        let y0 = self.y.max(0) as u32;
        let x1 = ((self.x + self.width as i64).min(image_width as i64)).max(0) as u32;
        let y1 = ((self.y + self.height as i64).min(image_height as i64)).max(0) as u32;

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Region::new(x0, y0, x1 - x0, y1 - y0, RegionKind::Face))
    }
}

/// Pluggable external face detection backend (Viola-Jones or equivalent).
/// The core never bundles an implementation.
pub trait FaceDetector: Send + Sync {
    fn detect_faces(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceBox>;

    /// Identifies the backend in cache partitions; override when two
    /// different backends may share a cache directory.
    fn name(&self) -> &str {
        "external"
    }
}

/// Selects face regions from an externally supplied list when available,
/// falling back to an optional live face detector. With neither, it returns
/// an empty sequence and lets the caller surface the "no faces" condition.
#[derive(Clone, Default)]
pub struct FaceRegionSelector {
    detector: Option<Arc<dyn FaceDetector>>,
}

impl FaceRegionSelector {
    pub fn new() -> Self {
        Self { detector: None }
    }

    pub fn with_detector(mut self, detector: Arc<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    fn boxes_for(&self, image: &RgbImage, hints: &SelectionHints) -> Vec<FaceBox> {
        if let Some(faces) = &hints.faces {
            return faces.clone();
        }

        match &self.detector {
            Some(detector) => {
                let gray = rgb_to_gray(image);
                detector.detect_faces(gray.as_raw(), image.width(), image.height())
            }
            None => {
                debug!("no face hints and no face detector configured");
                Vec::new()
            }
        }
    }
}

impl RegionSelector for FaceRegionSelector {
    fn fingerprint(&self) -> String {
        match &self.detector {
            Some(detector) => format!("faces-{}", detector.name()),
            None => "faces".to_string(),
        }
    }

    fn select(&self, image: &RgbImage, hints: &SelectionHints) -> Result<Vec<Region>> {
        let boxes = self.boxes_for(image, hints);
        let mut regions = Vec::with_capacity(boxes.len());

        for face in &boxes {
            match face.clamp(image.width(), image.height()) {
                Some(region) => regions.push(region),
                None => {
                    warn!(
                        "dropping face box {}x{} at ({}, {}) outside image bounds",
                        face.width, face.height, face.x, face.y
                    );
                }
            }
        }

        Ok(regions)
    }
}
