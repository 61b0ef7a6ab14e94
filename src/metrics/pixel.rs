use std::borrow::Cow;
use std::path::Path;

use image::RgbaImage;

use crate::error::PrtError;
use crate::image_loader::{load_pixel_buffer, rgba_image, PixelBuffer};
use crate::progress::Reporter;
use crate::types::{ComparisonMethod, IgnoreRegion, PixelComparisonResult, PixelMask};
use crate::Result;

use super::{ImageComparator, ImagePair, MethodOutcome};

/// Largest possible value of the weighted YIQ distance between two colors.
pub const MAX_YIQ_POSSIBLE_DELTA: f64 = 35215.0;

pub const DIFF_COLOR: [u8; 3] = [255, 0, 0];
pub const AA_COLOR: [u8; 3] = [255, 255, 0];

/// Opacity of the baseline luma drawn behind the diff when `diff_mask` is off.
const BACKGROUND_ALPHA: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct PixelComparator {
    /// Maximum `pixel_diff_ratio` that still passes (0.0 - 1.0)
    pub threshold: f64,
    /// Per-pixel color tolerance (0 - 255)
    pub color_threshold: u8,
    /// Exclude anti-aliased edge pixels from the diff count
    pub ignore_antialiasing: bool,
    pub ignore_regions: Vec<IgnoreRegion>,
    /// Leave identical pixels transparent instead of drawing a faded baseline
    pub diff_mask: bool,
}

impl Default for PixelComparator {
    fn default() -> Self {
        Self {
            threshold: 0.002,
            color_threshold: 10,
            ignore_antialiasing: true,
            ignore_regions: Vec::new(),
            diff_mask: true,
        }
    }
}

/// Pixel result plus the rendered diff buffer for the diff visualizer.
#[derive(Debug, Clone)]
pub struct PixelComparison {
    pub result: PixelComparisonResult,
    pub diff: RgbaImage,
}

impl PixelComparator {
    pub fn compare_files(
        &self,
        baseline: &Path,
        current: &Path,
        reporter: &dyn Reporter,
    ) -> Result<PixelComparison> {
        reporter.debug("Loading images...");
        let baseline = load_pixel_buffer(baseline)?;
        let current = load_pixel_buffer(current)?;
        self.compare(&baseline, &current, reporter)
    }

    pub fn compare(
        &self,
        baseline: &PixelBuffer,
        current: &PixelBuffer,
        reporter: &dyn Reporter,
    ) -> Result<PixelComparison> {
        if baseline.dimensions() != current.dimensions() {
            return Err(PrtError::dimension_mismatch(
                baseline.dimensions(),
                current.dimensions(),
            ));
        }

        let (width, height) = baseline.dimensions();
        let total_pixels = baseline.pixel_count();
        reporter.debug(&format!(
            "Comparing images: {width}x{height} ({total_pixels} pixels)"
        ));

        let mut img1 = rgba_bytes(baseline);
        let mut img2 = rgba_bytes(current);

        if let Some(mask) = PixelMask::build(width, height, &self.ignore_regions) {
            reporter.debug(&format!(
                "Masking {} ignored pixels",
                mask.ignored_count()
            ));
            apply_mask(img1.to_mut(), width, height, &mask)?;
            apply_mask(img2.to_mut(), width, height, &mask)?;
        }

        let mut diff = vec![0u8; total_pixels * 4];
        let diff_count = self.classify(&img1, &img2, &mut diff, width, height);

        let pixel_diff_ratio = if total_pixels > 0 {
            diff_count as f64 / total_pixels as f64
        } else {
            0.0
        };
        let max_color_diff = max_channel(&diff);
        let pass = pixel_diff_ratio <= self.threshold;

        reporter.debug(&format!(
            "Pixel diff: {diff_count} pixels ({:.4}%), max color diff: {max_color_diff}",
            pixel_diff_ratio * 100.0
        ));

        let diff = rgba_image(width, height, diff)?;

        Ok(PixelComparison {
            result: PixelComparisonResult {
                pixel_diff_count: diff_count,
                pixel_diff_ratio,
                max_color_diff,
                pass,
            },
            diff,
        })
    }

    /// Classify every pixel, paint `output`, and return the true-difference count.
    fn classify(&self, img1: &[u8], img2: &[u8], output: &mut [u8], width: u32, height: u32) -> u64 {
        if img1 == img2 {
            if !self.diff_mask {
                for pos in (0..img1.len()).step_by(4) {
                    draw_gray_pixel(img1, pos, output);
                }
            }
            return 0;
        }

        let t = f64::from(self.color_threshold) / 255.0;
        let max_delta = MAX_YIQ_POSSIBLE_DELTA * t * t;
        let mut count = 0u64;

        for y in 0..height {
            for x in 0..width {
                let pos = (y as usize * width as usize + x as usize) * 4;
                let delta = if img1[pos..pos + 4] == img2[pos..pos + 4] {
                    0.0
                } else {
                    color_delta(img1, img2, pos, pos, false)
                };

                if delta.abs() > max_delta {
                    let is_aa = self.ignore_antialiasing
                        && (antialiased(img1, img2, x, y, width, height)
                            || antialiased(img2, img1, x, y, width, height));
                    if is_aa {
                        draw_pixel(output, pos, AA_COLOR);
                    } else {
                        draw_pixel(output, pos, DIFF_COLOR);
                        count += 1;
                    }
                } else if !self.diff_mask {
                    draw_gray_pixel(img1, pos, output);
                }
            }
        }

        count
    }
}

impl ImageComparator for PixelComparator {
    fn method(&self) -> ComparisonMethod {
        ComparisonMethod::Pixel
    }

    fn compare(&self, pair: &ImagePair, reporter: &dyn Reporter) -> Result<MethodOutcome> {
        let comparison = PixelComparator::compare(self, &pair.baseline, &pair.current, reporter)?;
        Ok(MethodOutcome::Pixel(comparison))
    }
}

fn rgba_bytes(buf: &PixelBuffer) -> Cow<'_, [u8]> {
    if buf.channels() == PixelBuffer::RGBA_CHANNELS {
        Cow::Borrowed(buf.data())
    } else {
        Cow::Owned(buf.to_rgba().data().to_vec())
    }
}

/// Force RGB to black wherever the mask says ignore; alpha is left alone.
fn apply_mask(data: &mut [u8], width: u32, height: u32, mask: &PixelMask) -> Result<()> {
    if (mask.width(), mask.height()) != (width, height) {
        return Err(PrtError::InvalidPixelBuffer(format!(
            "ignore mask is {}x{} but image is {width}x{height}",
            mask.width(),
            mask.height()
        )));
    }
    for (idx, px) in data.chunks_exact_mut(4).enumerate() {
        if mask.is_ignored(idx) {
            px[..3].fill(0);
        }
    }
    Ok(())
}

fn max_channel(diff: &[u8]) -> u8 {
    diff.chunks_exact(4)
        .map(|px| px[0].max(px[1]).max(px[2]))
        .max()
        .unwrap_or(0)
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

/// Blend a channel value with white at opacity `a`.
fn blend(c: f64, a: f64) -> f64 {
    255.0 + (c - 255.0) * a
}

fn blended_rgb(img: &[u8], k: usize) -> (f64, f64, f64) {
    let (r, g, b, a) = (
        f64::from(img[k]),
        f64::from(img[k + 1]),
        f64::from(img[k + 2]),
        img[k + 3],
    );
    if a < 255 {
        let a = f64::from(a) / 255.0;
        (blend(r, a), blend(g, a), blend(b, a))
    } else {
        (r, g, b)
    }
}

/// Squared YIQ distance between pixel `k` of `img1` and pixel `m` of `img2`.
/// Negative when the second pixel is darker. With `y_only` only the signed
/// brightness difference is returned.
fn color_delta(img1: &[u8], img2: &[u8], k: usize, m: usize, y_only: bool) -> f64 {
    if img1[k..k + 4] == img2[m..m + 4] {
        return 0.0;
    }

    let (r1, g1, b1) = blended_rgb(img1, k);
    let (r2, g2, b2) = blended_rgb(img2, m);

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;

    if y_only {
        return y;
    }

    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);
    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;

    if y1 > y2 {
        -delta
    } else {
        delta
    }
}

/// Whether pixel (x1, y1) of `img` looks like an anti-aliased edge: it has at
/// most two identical neighbours, both darker and brighter neighbours, and the
/// darkest or brightest neighbour sits in a flat area in both images.
fn antialiased(img: &[u8], other: &[u8], x1: u32, y1: u32, width: u32, height: u32) -> bool {
    let x0 = x1.saturating_sub(1);
    let y0 = y1.saturating_sub(1);
    let x2 = (x1 + 1).min(width - 1);
    let y2 = (y1 + 1).min(height - 1);
    let pos = (y1 as usize * width as usize + x1 as usize) * 4;

    let mut zeroes = u32::from(x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2);
    let mut min = 0.0;
    let mut max = 0.0;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (0, 0, 0, 0);

    for x in x0..=x2 {
        for y in y0..=y2 {
            if x == x1 && y == y1 {
                continue;
            }

            let neighbour = (y as usize * width as usize + x as usize) * 4;
            let delta = color_delta(img, img, pos, neighbour, true);

            if delta == 0.0 {
                zeroes += 1;
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_x = x;
                min_y = y;
            } else if delta > max {
                max = delta;
                max_x = x;
                max_y = y;
            }
        }
    }

    if min == 0.0 || max == 0.0 {
        return false;
    }

    (has_many_siblings(img, min_x, min_y, width, height)
        && has_many_siblings(other, min_x, min_y, width, height))
        || (has_many_siblings(img, max_x, max_y, width, height)
            && has_many_siblings(other, max_x, max_y, width, height))
}

/// Whether pixel (x1, y1) has three or more identical neighbours.
fn has_many_siblings(img: &[u8], x1: u32, y1: u32, width: u32, height: u32) -> bool {
    let x0 = x1.saturating_sub(1);
    let y0 = y1.saturating_sub(1);
    let x2 = (x1 + 1).min(width - 1);
    let y2 = (y1 + 1).min(height - 1);
    let pos = (y1 as usize * width as usize + x1 as usize) * 4;
    let val = &img[pos..pos + 4];

    let mut zeroes = u32::from(x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2);
    for x in x0..=x2 {
        for y in y0..=y2 {
            if x == x1 && y == y1 {
                continue;
            }
            let k = (y as usize * width as usize + x as usize) * 4;
            if val == &img[k..k + 4] {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }
    false
}

fn draw_pixel(output: &mut [u8], pos: usize, [r, g, b]: [u8; 3]) {
    output[pos] = r;
    output[pos + 1] = g;
    output[pos + 2] = b;
    output[pos + 3] = 255;
}

fn draw_gray_pixel(img: &[u8], pos: usize, output: &mut [u8]) {
    let luma = rgb2y(
        f64::from(img[pos]),
        f64::from(img[pos + 1]),
        f64::from(img[pos + 2]),
    );
    let val = blend(luma, BACKGROUND_ALPHA * f64::from(img[pos + 3]) / 255.0) as u8;
    draw_pixel(output, pos, [val, val, val]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use image::Rgba;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(color))
    }

    fn buffer(img: RgbaImage) -> PixelBuffer {
        PixelBuffer::from_rgba_image(img)
    }

    #[test]
    fn mask_of_another_size_is_rejected() {
        let mask = PixelMask::build(4, 4, &[IgnoreRegion::new(0, 0, 2, 2)]).expect("mask");
        let mut data = vec![255u8; 2 * 2 * 4];
        let err = apply_mask(&mut data, 2, 2, &mask).unwrap_err();
        assert!(matches!(err, PrtError::InvalidPixelBuffer(ref m) if m.contains("4x4")));
        assert!(data.iter().all(|&b| b == 255));

        let mut data = vec![255u8; 4 * 4 * 4];
        apply_mask(&mut data, 4, 4, &mask).expect("apply");
        assert_eq!(&data[..4], &[0, 0, 0, 255]);
        assert_eq!(&data[8..12], &[255, 255, 255, 255]);
    }

    fn run(comparator: &PixelComparator, a: RgbaImage, b: RgbaImage) -> PixelComparison {
        comparator
            .compare(&buffer(a), &buffer(b), &SilentReporter)
            .expect("compare")
    }

    #[test]
    fn identical_images_have_no_diff() {
        let img = solid(20, 20, [200, 200, 200, 255]);
        let out = run(&PixelComparator::default(), img.clone(), img);
        assert_eq!(out.result.pixel_diff_count, 0);
        assert_eq!(out.result.pixel_diff_ratio, 0.0);
        assert_eq!(out.result.max_color_diff, 0);
        assert!(out.result.pass);
        assert!(out.diff.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn faded_background_draws_baseline_luma() {
        let img = solid(4, 4, [255, 255, 255, 255]);
        let comparator = PixelComparator {
            diff_mask: false,
            ..Default::default()
        };
        let out = run(&comparator, img.clone(), img);
        assert_eq!(out.result.pixel_diff_count, 0);
        assert_eq!(out.diff.get_pixel(0, 0).0, [255, 255, 255, 255]);
        // White background means the max channel is saturated even without diffs.
        assert_eq!(out.result.max_color_diff, 255);
    }

    #[test]
    fn changed_block_is_counted_and_painted_red() {
        let base = solid(10, 10, [255, 255, 255, 255]);
        let mut cur = base.clone();
        for y in 2..5 {
            for x in 2..5 {
                cur.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }

        let out = run(&PixelComparator::default(), base, cur);
        assert_eq!(out.result.pixel_diff_count, 9);
        assert!((out.result.pixel_diff_ratio - 0.09).abs() < 1e-12);
        assert_eq!(out.result.max_color_diff, 255);
        assert!(!out.result.pass);
        assert_eq!(out.diff.get_pixel(3, 3).0, [255, 0, 0, 255]);
        assert_eq!(out.diff.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn small_color_shift_below_threshold_is_ignored() {
        let base = solid(8, 8, [128, 128, 128, 255]);
        let mut cur = base.clone();
        cur.put_pixel(0, 0, Rgba([129, 128, 128, 255]));
        let out = run(&PixelComparator::default(), base, cur);
        assert_eq!(out.result.pixel_diff_count, 0);
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let err = PixelComparator::default()
            .compare(
                &buffer(solid(10, 10, [0, 0, 0, 255])),
                &buffer(solid(10, 12, [0, 0, 0, 255])),
                &SilentReporter,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            PrtError::DimensionMismatch {
                baseline: (10, 10),
                current: (10, 12)
            }
        ));
    }

    #[test]
    fn ignore_region_over_changed_area_removes_diff() {
        let base = solid(10, 10, [255, 255, 255, 255]);
        let mut cur = base.clone();
        cur.put_pixel(6, 6, Rgba([0, 0, 0, 255]));
        cur.put_pixel(7, 6, Rgba([0, 0, 0, 255]));

        let unmasked = run(&PixelComparator::default(), base.clone(), cur.clone());
        assert_eq!(unmasked.result.pixel_diff_count, 2);

        let masked = PixelComparator {
            ignore_regions: vec![IgnoreRegion::new(5, 5, 4, 4)],
            ..Default::default()
        };
        let out = run(&masked, base, cur);
        assert_eq!(out.result.pixel_diff_count, 0);
        assert!(out.result.pass);
    }

    #[test]
    fn lower_color_threshold_never_finds_fewer_diffs() {
        let base = solid(16, 16, [120, 120, 120, 255]);
        let mut cur = base.clone();
        for x in 0..16 {
            let shade = 120 + (x as u8) * 3;
            cur.put_pixel(x, 8, Rgba([shade, shade, shade, 255]));
        }

        let counts: Vec<u64> = [1u8, 10, 40, 120]
            .iter()
            .map(|&ct| {
                let cmp = PixelComparator {
                    color_threshold: ct,
                    ignore_antialiasing: false,
                    ..Default::default()
                };
                run(&cmp, base.clone(), cur.clone()).result.pixel_diff_count
            })
            .collect();

        assert!(counts.windows(2).all(|w| w[0] >= w[1]), "counts: {counts:?}");
        assert!(counts[0] > counts[3]);
    }

    #[test]
    fn antialiased_edge_pixel_is_excluded_by_default() {
        // Left half black, right half white; the current image adds a single
        // mid-gray pixel on the edge, which is how smoothing looks.
        let mut base = solid(9, 9, [255, 255, 255, 255]);
        for y in 0..9 {
            for x in 0..4 {
                base.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let mut cur = base.clone();
        cur.put_pixel(4, 4, Rgba([128, 128, 128, 255]));

        let excluded = run(&PixelComparator::default(), base.clone(), cur.clone());
        assert_eq!(excluded.result.pixel_diff_count, 0);
        assert_eq!(excluded.diff.get_pixel(4, 4).0, [255, 255, 0, 255]);

        let included = PixelComparator {
            ignore_antialiasing: false,
            ..Default::default()
        };
        let out = run(&included, base, cur);
        assert_eq!(out.result.pixel_diff_count, 1);
        assert_eq!(out.diff.get_pixel(4, 4).0, [255, 0, 0, 255]);
    }

    #[test]
    fn transparent_pixels_are_blended_with_white() {
        let opaque_white = solid(4, 4, [255, 255, 255, 255]);
        let clear_black = solid(4, 4, [0, 0, 0, 0]);
        let out = run(&PixelComparator::default(), opaque_white, clear_black);
        assert_eq!(out.result.pixel_diff_count, 0);
    }

    #[test]
    fn color_delta_sign_tracks_brightness() {
        let white = [255u8, 255, 255, 255];
        let black = [0u8, 0, 0, 255];
        assert!(color_delta(&white, &black, 0, 0, false) < 0.0);
        assert!(color_delta(&black, &white, 0, 0, false) > 0.0);
        let full = color_delta(&black, &white, 0, 0, false);
        assert!(full <= MAX_YIQ_POSSIBLE_DELTA);
    }
}
