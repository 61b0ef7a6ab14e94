//! Page Regression Tester (PRT) Library
//!
//! The comparison engine behind `prt`: decides whether a freshly rendered page
//! differs from a stored baseline beyond tolerance. Scores are deterministic
//! for identical inputs.
//!
//! # Module Overview
//!
//! - [`image_loader`] - Image decoding into RGBA pixel buffers
//! - [`metrics`] - Pixel, SSIM and layout comparators plus score aggregation
//! - [`diff_image`] - Diff image rendering (heatmap, side-by-side, overlay, blend)
//! - [`config`] - Configuration file support
//! - [`progress`] - Reporting capability passed into every comparison
//! - [`types`] - Core data types and structures
//! - [`output`] - JSON payloads and artifact writing
//!
//! # Example
//!
//! ```no_run
//! use prt_lib::{compare_images, CompareOptions, ComparisonMethod, TracingReporter};
//! use std::path::Path;
//!
//! # fn example() -> prt_lib::Result<()> {
//! let options = CompareOptions {
//!     methods: vec![ComparisonMethod::Pixel, ComparisonMethod::Ssim],
//!     ..Default::default()
//! };
//! let run = compare_images(
//!     Path::new("baseline.png"),
//!     Path::new("current.png"),
//!     &options,
//!     &TracingReporter,
//! )?;
//! println!("score {:.4}, pass {}", run.result.overall_score, run.result.overall_pass);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diff_image;
pub mod error;
pub mod image_loader;
pub mod metrics;
pub mod output;
pub mod progress;
pub mod types;

pub use config::Config;
pub use diff_image::{compose, render_diff_image, DiffStyle};
pub use error::{ErrorCategory, ErrorPayload, PrtError, Result};
pub use image_loader::{encode_png, load_pixel_buffer, PixelBuffer};
pub use metrics::{
    aggregate, compare_images, compare_pair, default_comparators, load_structure_snapshot,
    run_comparisons, CompareOptions, ComparisonRun, DuplicateXpathPolicy, ImageComparator,
    ImagePair, LayoutComparator, MethodOutcome, PixelComparator, PixelComparison, SsimComparator,
    StructureInputs, WindowBounds,
};
pub use output::{
    text_report, write_comparison_artifacts, write_layout_result, ArtifactOptions,
    CompareArtifacts, CompareOutput, ErrorOutput, LayoutOutput, PrtOutput, PRT_OUTPUT_VERSION,
};
pub use progress::{CallbackReporter, ProgressCallback, Reporter, SilentReporter, TracingReporter};
pub use types::{
    ComparisonMethod, ComparisonResult, IgnoreRegion, LayoutComparisonResult, LayoutDiff,
    LayoutStatus, MethodResults, PixelComparisonResult, SsimComparisonResult, StructureSnapshot,
};
