//! Diff image rendering.
//!
//! Turns the pixel comparator's diff buffer into one of four presentations
//! and encodes the result as PNG.

use std::fmt;
use std::str::FromStr;

use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::PrtError;
use crate::image_loader::encode_png;
use crate::metrics::ImagePair;
use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStyle {
    /// The raw diff buffer.
    #[default]
    Heatmap,
    /// Baseline, diff and current placed left to right.
    SideBySide,
    /// Diff drawn over the current image at half opacity.
    Overlay,
    /// Baseline and current averaged, with differences tinted.
    Blend,
}

impl DiffStyle {
    pub const fn all() -> [DiffStyle; 4] {
        [
            DiffStyle::Heatmap,
            DiffStyle::SideBySide,
            DiffStyle::Overlay,
            DiffStyle::Blend,
        ]
    }

    /// File name the rendered image is written under.
    pub fn file_name(&self) -> String {
        format!("diff-{self}.png")
    }
}

impl fmt::Display for DiffStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiffStyle::Heatmap => "heatmap",
            DiffStyle::SideBySide => "sidebyside",
            DiffStyle::Overlay => "overlay",
            DiffStyle::Blend => "blend",
        })
    }
}

impl FromStr for DiffStyle {
    type Err = PrtError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "heatmap" => Ok(DiffStyle::Heatmap),
            "sidebyside" => Ok(DiffStyle::SideBySide),
            "overlay" => Ok(DiffStyle::Overlay),
            "blend" => Ok(DiffStyle::Blend),
            other => Err(PrtError::UnknownDiffStyle(other.to_string())),
        }
    }
}

/// Render `diff` over the already decoded source images as PNG bytes.
pub fn render_diff_image(style: DiffStyle, images: &ImagePair, diff: &RgbaImage) -> Result<Vec<u8>> {
    if style == DiffStyle::Heatmap {
        return encode_png(diff);
    }
    let baseline = images.baseline.to_rgba_image()?;
    let current = images.current.to_rgba_image()?;
    let composed = compose(style, &baseline, &current, diff)?;
    encode_png(&composed)
}

/// Render `diff` in the given style. All three images must share dimensions.
pub fn compose(
    style: DiffStyle,
    baseline: &RgbaImage,
    current: &RgbaImage,
    diff: &RgbaImage,
) -> Result<RgbaImage> {
    for other in [current, diff] {
        if other.dimensions() != baseline.dimensions() {
            return Err(PrtError::dimension_mismatch(
                baseline.dimensions(),
                other.dimensions(),
            ));
        }
    }

    Ok(match style {
        DiffStyle::Heatmap => diff.clone(),
        DiffStyle::SideBySide => side_by_side(baseline, diff, current),
        DiffStyle::Overlay => overlay(current, diff),
        DiffStyle::Blend => blend(baseline, current, diff),
    })
}

fn side_by_side(baseline: &RgbaImage, diff: &RgbaImage, current: &RgbaImage) -> RgbaImage {
    let (w, h) = baseline.dimensions();
    let mut canvas = RgbaImage::new(w * 3, h);
    imageops::replace(&mut canvas, baseline, 0, 0);
    imageops::replace(&mut canvas, diff, i64::from(w), 0);
    imageops::replace(&mut canvas, current, i64::from(w) * 2, 0);
    canvas
}

fn overlay(current: &RgbaImage, diff: &RgbaImage) -> RgbaImage {
    let mut out = current.clone();
    for (dst, src) in out.pixels_mut().zip(diff.pixels()) {
        let alpha = f32::from(src[3]) / 255.0 * 0.5;
        if alpha == 0.0 {
            continue;
        }
        *dst = source_over(*dst, *src, alpha);
    }
    out
}

fn blend(baseline: &RgbaImage, current: &RgbaImage, diff: &RgbaImage) -> RgbaImage {
    let mut out = RgbaImage::new(baseline.width(), baseline.height());
    for (((dst, a), b), d) in out
        .pixels_mut()
        .zip(baseline.pixels())
        .zip(current.pixels())
        .zip(diff.pixels())
    {
        let mut px = Rgba([0u8; 4]);
        for c in 0..4 {
            px[c] = ((u16::from(a[c]) + u16::from(b[c]) + 1) / 2) as u8;
        }
        if is_marked(d) {
            px = source_over(px, *d, 0.5);
        }
        *dst = px;
    }
    out
}

/// Painted pixels are opaque and chromatic; the faded background is gray.
fn is_marked(px: &Rgba<u8>) -> bool {
    px[3] == 255 && !(px[0] == px[1] && px[1] == px[2])
}

/// Composite `src` over `dst` with an effective source opacity of `alpha`.
fn source_over(dst: Rgba<u8>, src: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let dst_alpha = f32::from(dst[3]) / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (f32::from(src[c]) * alpha + f32::from(dst[c]) * dst_alpha * (1.0 - alpha))
            / out_alpha;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}
