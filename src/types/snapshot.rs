//! Structure snapshot types produced by the page capture step.
//!
//! A snapshot records the geometry and a fixed subset of computed styles for
//! every visible element, keyed by xpath. Snapshots are consumed read-only by
//! the layout comparator.

use serde::{Deserialize, Serialize};

use super::core::Rect;

/// Viewport the page was captured at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Device pixel ratio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpr: Option<f64>,
}

/// A serialized record of a page's visible element geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureSnapshot {
    /// The URL of the captured page
    pub url: String,
    pub viewport: Viewport,
    /// ISO-8601 capture time
    pub timestamp: String,
    /// Elements in document order
    pub elements: Vec<ElementSnapshot>,
}

/// A single captured element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Path identifier used to join baseline and current snapshots
    pub xpath: String,
    /// Best-match CSS selector
    pub selector: String,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testid: Option<String>,
    /// Truncated text content
    pub text: String,
    pub rect: Rect,
    pub styles: ElementStyles,
}

/// Computed styles recorded for each element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyles {
    pub display: String,
    pub position: String,
    pub font_size: String,
    pub line_height: String,
    pub color: String,
    pub margin: String,
    pub padding: String,
}
