//! Result types for comparison output.
//!
//! These types are serialized verbatim into `result.json`:
//! - Pixel comparison (perceptual per-pixel diff)
//! - SSIM comparison (windowed structural similarity)
//! - Layout comparison (xpath-keyed element geometry)
//! - The aggregate [`ComparisonResult`]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::core::{PositionDiff, Rect, SizeDiff};
use crate::error::PrtError;

// ============================================================================
// Methods
// ============================================================================

/// Image comparison method that contributes to the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMethod {
    Pixel,
    Ssim,
}

impl ComparisonMethod {
    pub const fn all() -> [ComparisonMethod; 2] {
        [ComparisonMethod::Pixel, ComparisonMethod::Ssim]
    }
}

impl fmt::Display for ComparisonMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonMethod::Pixel => "pixel",
            ComparisonMethod::Ssim => "ssim",
        })
    }
}

impl FromStr for ComparisonMethod {
    type Err = PrtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pixel" => Ok(ComparisonMethod::Pixel),
            "ssim" => Ok(ComparisonMethod::Ssim),
            other => Err(PrtError::Config(format!(
                "Invalid comparison method: {other} (valid methods: pixel, ssim)"
            ))),
        }
    }
}

// ============================================================================
// Pixel / SSIM
// ============================================================================

/// Result of the per-pixel perceptual comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelComparisonResult {
    /// Pixels classified as true differences
    pub pixel_diff_count: u64,
    /// `pixel_diff_count / (width * height)`
    pub pixel_diff_ratio: f64,
    /// Largest single RGB channel value in the diff buffer
    pub max_color_diff: u8,
    pub pass: bool,
}

/// Result of the SSIM comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsimComparisonResult {
    /// Mean windowed SSIM, 1.0 = identical
    pub ssim_score: f64,
    /// `1 - ssim_score`
    pub ssim_diff_ratio: f64,
    pub pass: bool,
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStatus {
    Unchanged,
    Moved,
    Resized,
    Added,
    Removed,
}

/// One changed, added or removed element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDiff {
    pub xpath: String,
    pub selector: String,
    pub status: LayoutStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_rect: Option<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rect: Option<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_diff: Option<PositionDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_diff: Option<SizeDiff>,
    /// Euclidean length of the position delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_shift: Option<f64>,
}

/// Result of comparing two structure snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutComparisonResult {
    pub added_elements: u32,
    pub removed_elements: u32,
    pub moved_elements: u32,
    pub resized_elements: u32,
    /// Largest position delta among changed elements
    pub max_shift: f64,
    /// `(moved + resized + added + removed) / |xpath union|`
    pub layout_diff_ratio: f64,
    #[serde(default)]
    pub layout_diffs: Vec<LayoutDiff>,
    pub pass: bool,
}

// ============================================================================
// Aggregate
// ============================================================================

/// Per-method results; absent entries did not run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel: Option<PixelComparisonResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssim: Option<SsimComparisonResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<LayoutComparisonResult>,
}

/// Complete comparison result written to `result.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub baseline: String,
    pub current: String,
    pub timestamp: String,
    pub methods: Vec<ComparisonMethod>,
    pub threshold: f64,
    pub results: MethodResults,
    pub overall_pass: bool,
    /// 0.0 - 1.0, where 1.0 means identical
    pub overall_score: f64,
}
