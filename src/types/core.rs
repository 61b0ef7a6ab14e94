//! Geometry and masking primitives.
//!
//! - [`IgnoreRegion`] - rectangle excluded from pixel comparison
//! - [`PixelMask`] - per-pixel compare/ignore flags derived from regions
//! - [`Rect`], [`PositionDiff`], [`SizeDiff`] - element geometry

use serde::{Deserialize, Serialize};

/// Rectangle excluded from pixel comparison, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl IgnoreRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Pixel span `[x0, x1) x [y0, y1)` clipped to an image of the given size.
    /// Returns `None` when the region does not touch the image.
    fn clipped(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = i64::from(self.x).max(0);
        let y0 = i64::from(self.y).max(0);
        let x1 = (i64::from(self.x) + i64::from(self.width)).min(i64::from(image_width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).min(i64::from(image_height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// Per-pixel comparison mask: [`PixelMask::IGNORE`] or [`PixelMask::COMPARE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMask {
    width: u32,
    height: u32,
    values: Vec<u8>,
}

impl PixelMask {
    pub const IGNORE: u8 = 0;
    pub const COMPARE: u8 = 255;

    /// Build a mask for the given regions. `None` when there is nothing to ignore.
    pub fn build(width: u32, height: u32, regions: &[IgnoreRegion]) -> Option<Self> {
        if regions.is_empty() {
            return None;
        }

        let mut values = vec![Self::COMPARE; width as usize * height as usize];
        for region in regions {
            let Some((x0, y0, x1, y1)) = region.clipped(width, height) else {
                continue;
            };
            for y in y0..y1 {
                let row = y as usize * width as usize;
                values[row + x0 as usize..row + x1 as usize].fill(Self::IGNORE);
            }
        }

        Some(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mask value for the pixel at linear index `idx`.
    pub fn value(&self, idx: usize) -> u8 {
        self.values[idx]
    }

    pub fn is_ignored(&self, idx: usize) -> bool {
        self.values[idx] == Self::IGNORE
    }

    pub fn ignored_count(&self) -> usize {
        self.values.iter().filter(|v| **v == Self::IGNORE).count()
    }
}

/// Position and size of an element on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionDiff {
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeDiff {
    pub dw: f64,
    pub dh: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_regions_means_no_mask() {
        assert!(PixelMask::build(10, 10, &[]).is_none());
    }

    #[test]
    fn mask_marks_region_pixels_as_ignored() {
        let mask = PixelMask::build(10, 10, &[IgnoreRegion::new(2, 3, 4, 2)]).expect("mask");
        assert_eq!(mask.ignored_count(), 8);
        assert!(mask.is_ignored(3 * 10 + 2));
        assert!(mask.is_ignored(4 * 10 + 5));
        assert!(!mask.is_ignored(4 * 10 + 6));
        assert_eq!(mask.value(0), PixelMask::COMPARE);
    }

    #[test]
    fn overlapping_regions_are_merged() {
        let regions = [IgnoreRegion::new(0, 0, 4, 4), IgnoreRegion::new(2, 2, 4, 4)];
        let mask = PixelMask::build(10, 10, &regions).expect("mask");
        assert_eq!(mask.ignored_count(), 16 + 16 - 4);
    }

    #[test]
    fn regions_are_clipped_to_the_image() {
        let regions = [
            IgnoreRegion::new(-5, -5, 7, 7),
            IgnoreRegion::new(8, 8, 100, 100),
            IgnoreRegion::new(50, 50, 5, 5),
        ];
        let mask = PixelMask::build(10, 10, &regions).expect("mask");
        // 2x2 in the top-left corner, 2x2 in the bottom-right corner.
        assert_eq!(mask.ignored_count(), 8);
        assert!(mask.is_ignored(0));
        assert!(mask.is_ignored(99));
        // Negative x must not wrap into the previous row.
        assert!(!mask.is_ignored(9));
    }
}
