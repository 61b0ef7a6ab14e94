//! Data types shared by the comparators and the CLI.
//!
//! - [`core`] - geometry and masking primitives
//! - [`snapshot`] - structure snapshots produced by the capture step
//! - [`results`] - comparator and aggregate results

pub mod core;
pub mod results;
pub mod snapshot;

pub use self::core::{IgnoreRegion, PixelMask, PositionDiff, Rect, SizeDiff};
pub use self::results::{
    ComparisonMethod, ComparisonResult, LayoutComparisonResult, LayoutDiff, LayoutStatus,
    MethodResults, PixelComparisonResult, SsimComparisonResult,
};
pub use self::snapshot::{ElementSnapshot, ElementStyles, StructureSnapshot, Viewport};
