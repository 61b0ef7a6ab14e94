use std::path::Path;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::PrtError;
use crate::image_loader::{load_pixel_buffer, PixelBuffer};
use crate::progress::Reporter;
use crate::types::{ComparisonMethod, SsimComparisonResult};
use crate::Result;

use super::{ImageComparator, ImagePair, MethodOutcome};

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const L: f64 = 255.0;
const C1: f64 = (K1 * L) * (K1 * L);
const C2: f64 = (K2 * L) * (K2 * L);
const WINDOW_SIZE: u32 = 11;

/// How the vertical extent of each SSIM window is clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowBounds {
    /// Clip windows to the image on both axes.
    #[default]
    Image,
    /// Clip the vertical extent to the image width as well as its height.
    /// Rows at or below `width` get empty windows and score 1.0, which
    /// reproduces scores recorded by older baselines on portrait images.
    LegacyWidth,
}

#[derive(Debug, Clone, Copy)]
pub struct SsimComparator {
    /// Maximum `ssim_diff_ratio` that still passes
    pub threshold: f64,
    pub window_bounds: WindowBounds,
}

impl Default for SsimComparator {
    fn default() -> Self {
        Self {
            threshold: 0.002,
            window_bounds: WindowBounds::Image,
        }
    }
}

impl SsimComparator {
    pub fn compare_files(
        &self,
        baseline: &Path,
        current: &Path,
        reporter: &dyn Reporter,
    ) -> Result<SsimComparisonResult> {
        let baseline = load_pixel_buffer(baseline)?;
        let current = load_pixel_buffer(current)?;
        self.compare(&baseline, &current, reporter)
    }

    pub fn compare(
        &self,
        baseline: &PixelBuffer,
        current: &PixelBuffer,
        reporter: &dyn Reporter,
    ) -> Result<SsimComparisonResult> {
        reporter.info("Running SSIM comparison...");

        if baseline.dimensions() != current.dimensions() {
            return Err(PrtError::dimension_mismatch(
                baseline.dimensions(),
                current.dimensions(),
            ));
        }

        let gray1 = baseline.to_grayscale();
        let gray2 = current.to_grayscale();
        let ssim_score = self.score(&gray1, &gray2);
        let ssim_diff_ratio = 1.0 - ssim_score;
        let pass = ssim_diff_ratio <= self.threshold;

        reporter.info(&format!(
            "SSIM score: {ssim_score:.4} (diff: {ssim_diff_ratio:.4}) - {}",
            if pass { "PASS" } else { "FAIL" }
        ));

        Ok(SsimComparisonResult {
            ssim_score,
            ssim_diff_ratio,
            pass,
        })
    }

    /// Mean SSIM sampled every `WINDOW_SIZE / 2` pixels on both axes.
    pub fn score(&self, img1: &GrayImage, img2: &GrayImage) -> f64 {
        let (width, height) = img1.dimensions();
        let step = (WINDOW_SIZE / 2).max(1) as usize;
        let data1 = img1.as_raw();
        let data2 = img2.as_raw();

        let mut sum = 0.0;
        let mut samples = 0u64;

        for y in (0..height).step_by(step) {
            for x in (0..width).step_by(step) {
                let window = self.window(x, y, width, height);
                sum += window_ssim(data1, data2, width, window);
                samples += 1;
            }
        }

        if samples > 0 {
            sum / samples as f64
        } else {
            1.0
        }
    }

    /// Window `[x0, x1) x [y0, y1)` centred on (x, y).
    fn window(&self, x: u32, y: u32, width: u32, height: u32) -> Window {
        let half = WINDOW_SIZE / 2;
        let y_limit = match self.window_bounds {
            WindowBounds::Image => height,
            WindowBounds::LegacyWidth => width.min(height),
        };
        Window {
            x0: x.saturating_sub(half),
            x1: (x + half + 1).min(width),
            y0: y.saturating_sub(half),
            y1: (y + half + 1).min(y_limit),
        }
    }
}

impl ImageComparator for SsimComparator {
    fn method(&self) -> ComparisonMethod {
        ComparisonMethod::Ssim
    }

    fn compare(&self, pair: &ImagePair, reporter: &dyn Reporter) -> Result<MethodOutcome> {
        let result = SsimComparator::compare(self, &pair.baseline, &pair.current, reporter)?;
        Ok(MethodOutcome::Ssim(result))
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
}

impl Window {
    fn indices(self, width: u32) -> impl Iterator<Item = usize> {
        (self.y0..self.y1).flat_map(move |py| {
            (self.x0..self.x1).map(move |px| py as usize * width as usize + px as usize)
        })
    }
}

/// SSIM of one window. Empty windows have zero mean and variance, so the
/// formula reduces to `C1 * C2 / (C1 * C2) = 1`.
fn window_ssim(data1: &[u8], data2: &[u8], width: u32, window: Window) -> f64 {
    let mut count = 0u32;
    let (mut sum1, mut sum2) = (0.0, 0.0);
    for idx in window.indices(width) {
        sum1 += f64::from(data1[idx]);
        sum2 += f64::from(data2[idx]);
        count += 1;
    }

    let (mean1, mean2) = if count > 0 {
        (sum1 / f64::from(count), sum2 / f64::from(count))
    } else {
        (0.0, 0.0)
    };

    let (mut var1, mut var2, mut covar) = (0.0, 0.0, 0.0);
    for idx in window.indices(width) {
        let d1 = f64::from(data1[idx]) - mean1;
        let d2 = f64::from(data2[idx]) - mean2;
        var1 += d1 * d1;
        var2 += d2 * d2;
        covar += d1 * d2;
    }
    if count > 0 {
        let n = f64::from(count);
        var1 /= n;
        var2 /= n;
        covar /= n;
    }

    let numerator = (2.0 * mean1 * mean2 + C1) * (2.0 * covar + C2);
    let denominator = (mean1 * mean1 + mean2 * mean2 + C1) * (var1 + var2 + C2);

    if denominator > 0.0 {
        numerator / denominator
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use image::{Luma, Rgba, RgbaImage};

    fn checkerboard(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    fn gradient(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]))
    }

    #[test]
    fn identical_images_score_one() {
        let img = PixelBuffer::from_rgba_image(checkerboard(40, 40));
        let result = SsimComparator::default()
            .compare(&img, &img, &SilentReporter)
            .expect("ssim");
        assert!((result.ssim_score - 1.0).abs() < 1e-9);
        assert!(result.ssim_diff_ratio.abs() < 1e-9);
        assert!(result.pass);
    }

    #[test]
    fn identical_wide_and_tall_images_score_one_under_both_bounds() {
        for bounds in [WindowBounds::Image, WindowBounds::LegacyWidth] {
            let cmp = SsimComparator {
                window_bounds: bounds,
                ..Default::default()
            };
            for (w, h) in [(60, 20), (20, 60)] {
                let img = gradient(w, h);
                let score = cmp.score(&img, &img);
                assert!((score - 1.0).abs() < 1e-9, "{bounds:?} {w}x{h}: {score}");
            }
        }
    }

    #[test]
    fn different_images_score_lower_and_fail_strict_threshold() {
        let a = PixelBuffer::from_rgba_image(checkerboard(40, 40));
        let b = PixelBuffer::from_rgba_image(RgbaImage::from_pixel(40, 40, Rgba([128, 128, 128, 255])));

        let strict = SsimComparator {
            threshold: 0.001,
            ..Default::default()
        };
        let result = strict.compare(&a, &b, &SilentReporter).expect("ssim");
        assert!(result.ssim_score < 1.0);
        assert!(result.ssim_diff_ratio > 0.0);
        assert!(!result.pass);

        let lenient = SsimComparator {
            threshold: 1.0,
            ..Default::default()
        };
        assert!(lenient.compare(&a, &b, &SilentReporter).expect("ssim").pass);
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let a = PixelBuffer::from_rgba_image(checkerboard(10, 10));
        let b = PixelBuffer::from_rgba_image(checkerboard(20, 20));
        let err = SsimComparator::default()
            .compare(&a, &b, &SilentReporter)
            .unwrap_err();
        assert!(err.to_string().contains("Image dimensions do not match"));
    }

    #[test]
    fn legacy_bounds_ignore_rows_below_width_on_portrait_images() {
        // Difference confined to the bottom half of a 20x60 image.
        let a = gradient(20, 60);
        let mut b = a.clone();
        for y in 40..60 {
            for x in 0..20 {
                b.put_pixel(x, y, Luma([255 - a.get_pixel(x, y).0[0]]));
            }
        }

        let fixed = SsimComparator::default().score(&a, &b);
        let legacy = SsimComparator {
            window_bounds: WindowBounds::LegacyWidth,
            ..Default::default()
        }
        .score(&a, &b);

        assert!(fixed < 1.0);
        assert!((legacy - 1.0).abs() < 1e-9, "legacy score {legacy}");
        assert!(legacy > fixed);
    }

    #[test]
    fn bounds_agree_on_landscape_images() {
        let a = gradient(60, 20);
        let b = GrayImage::from_fn(60, 20, |x, _| Luma([(x * 4) as u8]));
        let fixed = SsimComparator::default().score(&a, &b);
        let legacy = SsimComparator {
            window_bounds: WindowBounds::LegacyWidth,
            ..Default::default()
        }
        .score(&a, &b);
        assert_eq!(fixed, legacy);
    }

    #[test]
    fn empty_image_scores_one() {
        let empty = GrayImage::new(0, 0);
        assert_eq!(SsimComparator::default().score(&empty, &empty), 1.0);
    }
}
