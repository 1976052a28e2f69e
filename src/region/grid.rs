use image::RgbImage;
use log::debug;

use crate::{
    error::Result,
    region::{Region, RegionKind, RegionSelector, SelectionHints},
};

/// Partitions the image into a fixed grid of generic analysis tiles,
/// independent of any face information. Tiles are emitted row-major, so the
/// sequence is stable for a given image size.
#[derive(Debug, Clone)]
pub struct GridRegionSelector {
    rows: u32,
    cols: u32,
    min_tile_edge: u32,
}

impl GridRegionSelector {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            min_tile_edge: 8,
        }
    }

    pub fn with_min_tile_edge(mut self, edge: u32) -> Self {
        self.min_tile_edge = edge;
        self
    }
}

impl Default for GridRegionSelector {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl RegionSelector for GridRegionSelector {
    fn fingerprint(&self) -> String {
        format!("grid{}x{}m{}", self.rows, self.cols, self.min_tile_edge)
    }

    fn select(&self, image: &RgbImage, _hints: &SelectionHints) -> Result<Vec<Region>> {
        let (width, height) = image.dimensions();
        let tile_w = width / self.cols;
        let tile_h = height / self.rows;

        if tile_w < self.min_tile_edge || tile_h < self.min_tile_edge {
            debug!(
                "image {}x{} too small for a {}x{} grid with minimum tile edge {}",
                width, height, self.rows, self.cols, self.min_tile_edge
            );
            return Ok(Vec::new());
        }

        let mut regions = Vec::with_capacity((self.rows * self.cols) as usize);
        for row in 0..self.rows {
            for col in 0..self.cols {
                // Last row/column absorbs the remainder so the tiles cover
                // the full image.
                let x = col * tile_w;
                let y = row * tile_h;
                let w = if col == self.cols - 1 { width - x } else { tile_w };
                let h = if row == self.rows - 1 { height - y } else { tile_h };
                regions.push(Region::new(x, y, w, h, RegionKind::Generic));
            }
        }

        Ok(regions)
    }
}
