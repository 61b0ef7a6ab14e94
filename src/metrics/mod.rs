//! Comparison engine.
//!
//! - Pixel comparison (perceptual YIQ delta with anti-aliasing detection)
//! - SSIM comparison (windowed structural similarity over grayscale)
//! - Layout comparison (xpath-keyed element geometry)
//! - Aggregation of the image methods into one score and verdict

mod layout;
mod pixel;
mod runner;
mod ssim;


pub use layout::{load_structure_snapshot, DuplicateXpathPolicy, LayoutComparator};
pub use pixel::{PixelComparator, PixelComparison, AA_COLOR, DIFF_COLOR, MAX_YIQ_POSSIBLE_DELTA};
pub use runner::{
    aggregate, compare_images, compare_pair, default_comparators, run_comparisons, utc_timestamp,
    CompareOptions, ComparisonRun, ImageComparator, ImagePair, MethodOutcome, MethodRun,
    StructureInputs, PASS_SCORE_OVERRIDE,
};
pub use ssim::{SsimComparator, WindowBounds};
