use image::{GrayImage, Luma, RgbImage};
use ndarray::Array2;

use crate::{error::Result, region::Region};

pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let lum =
            (0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64) as u8;
        gray.put_pixel(x, y, Luma([lum]));
    }

    gray
}

pub fn gray_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut arr = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        arr[[y as usize, x as usize]] = pixel[0] as f64;
    }

    arr
}

/// Crops the region out of the image. The region must already be clamped to
/// the image bounds and have non-zero area.
pub fn crop_region(image: &RgbImage, region: &Region) -> Result<RgbImage> {
    region.validate(image.width(), image.height())?;

    let mut crop = RgbImage::new(region.width, region.height);
    for dy in 0..region.height {
        for dx in 0..region.width {
            crop.put_pixel(dx, dy, *image.get_pixel(region.x + dx, region.y + dy));
        }
    }

    Ok(crop)
}

pub fn sobel_x(gray: &Array2<f64>, y: usize, x: usize) -> f64 {
    let p = |dy: i64, dx: i64| -> f64 {
        gray[[(y as i64 + dy) as usize, (x as i64 + dx) as usize]]
    };

    -p(-1, -1) - 2.0 * p(0, -1) - p(1, -1) + p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)
}

pub fn sobel_y(gray: &Array2<f64>, y: usize, x: usize) -> f64 {
    let p = |dy: i64, dx: i64| -> f64 {
        gray[[(y as i64 + dy) as usize, (x as i64 + dx) as usize]]
    };

    -p(-1, -1) - 2.0 * p(-1, 0) - p(-1, 1) + p(1, -1) + 2.0 * p(1, 0) + p(1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionKind;
    use image::Rgb;

    #[test]
    fn gray_conversion_dimensions() {
        let img = RgbImage::from_pixel(8, 6, Rgb([100, 150, 200]));
        let gray = rgb_to_gray(&img);
        assert_eq!(gray.dimensions(), (8, 6));
    }

    #[test]
    fn crop_region_extracts_expected_pixels() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        img.put_pixel(3, 4, Rgb([255, 0, 0]));

        let region = Region::new(2, 3, 4, 4, RegionKind::Generic);
        let crop = crop_region(&img, &region).unwrap();

        assert_eq!(crop.dimensions(), (4, 4));
        assert_eq!(crop.get_pixel(1, 1)[0], 255);
    }

    #[test]
    fn crop_rejects_out_of_bounds_region() {
        let img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let region = Region::new(8, 8, 4, 4, RegionKind::Generic);
        assert!(crop_region(&img, &region).is_err());
    }
}
