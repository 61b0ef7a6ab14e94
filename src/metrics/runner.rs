use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use image::RgbaImage;

use crate::error::PrtError;
use crate::image_loader::{load_pixel_buffer, PixelBuffer};
use crate::progress::Reporter;
use crate::types::{
    ComparisonMethod, ComparisonResult, IgnoreRegion, MethodResults, SsimComparisonResult,
};
use crate::Result;

use super::{
    DuplicateXpathPolicy, LayoutComparator, PixelComparator, PixelComparison, SsimComparator,
    WindowBounds,
};

/// Overall scores at or above this pass even when an individual method failed.
pub const PASS_SCORE_OVERRIDE: f64 = 0.85;

/// An image comparison method that contributes to the aggregate score.
pub trait ImageComparator: Send + Sync {
    fn method(&self) -> ComparisonMethod;
    fn compare(&self, pair: &ImagePair, reporter: &dyn Reporter) -> Result<MethodOutcome>;
}

/// Baseline and current images, decoded once and shared by every comparator.
#[derive(Debug, Clone)]
pub struct ImagePair {
    pub baseline: PixelBuffer,
    pub current: PixelBuffer,
}

impl ImagePair {
    pub fn new(baseline: PixelBuffer, current: PixelBuffer) -> Self {
        Self { baseline, current }
    }

    pub fn load(baseline: &Path, current: &Path) -> Result<Self> {
        Ok(Self {
            baseline: load_pixel_buffer(baseline)?,
            current: load_pixel_buffer(current)?,
        })
    }
}

#[derive(Debug, Clone)]
pub enum MethodOutcome {
    Pixel(PixelComparison),
    Ssim(SsimComparisonResult),
}

/// Snapshot pair attached to an image comparison for reporting.
#[derive(Debug, Clone)]
pub struct StructureInputs {
    pub baseline: PathBuf,
    pub current: PathBuf,
    pub duplicates: DuplicateXpathPolicy,
}

/// Fully resolved settings for one image comparison.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub methods: Vec<ComparisonMethod>,
    pub threshold: f64,
    pub color_threshold: u8,
    pub ignore_antialiasing: bool,
    pub ignore_regions: Vec<IgnoreRegion>,
    pub diff_mask: bool,
    pub window_bounds: WindowBounds,
    pub structure: Option<StructureInputs>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            methods: vec![ComparisonMethod::Pixel],
            threshold: 0.002,
            color_threshold: 10,
            ignore_antialiasing: true,
            ignore_regions: Vec::new(),
            diff_mask: true,
            window_bounds: WindowBounds::Image,
            structure: None,
        }
    }
}

/// Per-method results plus the pixel diff buffer, if the pixel method ran.
#[derive(Debug, Clone, Default)]
pub struct MethodRun {
    pub results: MethodResults,
    pub diff: Option<RgbaImage>,
}

/// Aggregate result plus what the diff visualizer needs: the pixel diff
/// buffer and the decoded source images.
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    pub result: ComparisonResult,
    pub diff: Option<RgbaImage>,
    pub images: ImagePair,
}

/// Returns the comparators for every supported method, configured from `options`.
pub fn default_comparators(options: &CompareOptions) -> Vec<Box<dyn ImageComparator>> {
    vec![
        Box::new(PixelComparator {
            threshold: options.threshold,
            color_threshold: options.color_threshold,
            ignore_antialiasing: options.ignore_antialiasing,
            ignore_regions: options.ignore_regions.clone(),
            diff_mask: options.diff_mask,
        }),
        Box::new(SsimComparator {
            threshold: options.threshold,
            window_bounds: options.window_bounds,
        }),
    ]
}

/// Run the selected comparators on `pair`.
///
/// More than one comparator runs on scoped threads; results are merged in
/// `selected` order and the first error (in that order) aborts the run.
pub fn run_comparisons(
    comparators: &[Box<dyn ImageComparator>],
    selected: &[ComparisonMethod],
    pair: &ImagePair,
    reporter: &dyn Reporter,
) -> Result<MethodRun> {
    let mut desired: Vec<ComparisonMethod> = Vec::with_capacity(selected.len());
    for method in selected {
        if !desired.contains(method) {
            desired.push(*method);
        }
    }

    let missing: Vec<String> = desired
        .iter()
        .filter(|method| !comparators.iter().any(|c| c.method() == **method))
        .map(|method| method.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PrtError::Config(format!(
            "Requested methods not available: {}",
            missing.join(", ")
        )));
    }

    let jobs: Vec<&dyn ImageComparator> = desired
        .iter()
        .filter_map(|method| {
            comparators
                .iter()
                .find(|c| c.method() == *method)
                .map(|c| c.as_ref())
        })
        .collect();

    let outcomes: Vec<Result<MethodOutcome>> = match jobs.as_slice() {
        [] => Vec::new(),
        [only] => vec![only.compare(pair, reporter)],
        _ => std::thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .iter()
                .map(|comparator| scope.spawn(move || comparator.compare(pair, reporter)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        }),
    };

    let mut run = MethodRun::default();
    for outcome in outcomes {
        match outcome? {
            MethodOutcome::Pixel(PixelComparison { result, diff }) => {
                run.results.pixel = Some(result);
                run.diff = Some(diff);
            }
            MethodOutcome::Ssim(result) => run.results.ssim = Some(result),
        }
    }

    Ok(run)
}

/// Combine per-method results into `(overall_score, overall_pass)`.
///
/// The score is the mean of `1 - pixel_diff_ratio` and `ssim_score` over the
/// methods that ran (1.0 when none did). A run passes when every method
/// passed, or when the score reaches [`PASS_SCORE_OVERRIDE`]. Structure
/// results are informational and do not take part.
pub fn aggregate(results: &MethodResults) -> (f64, bool) {
    let mut sum = 0.0;
    let mut count = 0u32;
    let mut all_passed = true;

    if let Some(pixel) = &results.pixel {
        sum += 1.0 - pixel.pixel_diff_ratio;
        count += 1;
        all_passed &= pixel.pass;
    }
    if let Some(ssim) = &results.ssim {
        sum += ssim.ssim_score;
        count += 1;
        all_passed &= ssim.pass;
    }

    let score = if count > 0 {
        sum / f64::from(count)
    } else {
        1.0
    };
    (score, all_passed || score >= PASS_SCORE_OVERRIDE)
}

/// Load both images and run a full comparison.
pub fn compare_images(
    baseline: &Path,
    current: &Path,
    options: &CompareOptions,
    reporter: &dyn Reporter,
) -> Result<ComparisonRun> {
    reporter.info("Comparing images...");
    reporter.info(&format!("Baseline: {}", baseline.display()));
    reporter.info(&format!("Current: {}", current.display()));

    let pair = ImagePair::load(baseline, current)?;
    compare_pair(
        &display_path(baseline),
        &display_path(current),
        pair,
        options,
        reporter,
    )
}

/// Run a full comparison on already decoded images. `baseline` and `current`
/// are the labels recorded in the result; `pair` is kept on the run.
pub fn compare_pair(
    baseline: &str,
    current: &str,
    pair: ImagePair,
    options: &CompareOptions,
    reporter: &dyn Reporter,
) -> Result<ComparisonRun> {
    let timestamp = utc_timestamp();
    let comparators = default_comparators(options);
    let MethodRun { mut results, diff } =
        run_comparisons(&comparators, &options.methods, &pair, reporter)?;

    if let Some(structure) = &options.structure {
        let layout = LayoutComparator {
            threshold: options.threshold,
            duplicates: structure.duplicates,
        };
        results.structure =
            Some(layout.compare_files(&structure.baseline, &structure.current, reporter)?);
    }

    let (overall_score, overall_pass) = aggregate(&results);
    reporter.info(&format!(
        "Overall Score: {:.2}% similarity",
        overall_score * 100.0
    ));
    reporter.info(&format!(
        "Overall: {}",
        if overall_pass { "PASS" } else { "FAIL" }
    ));

    Ok(ComparisonRun {
        result: ComparisonResult {
            baseline: baseline.to_string(),
            current: current.to_string(),
            timestamp,
            methods: options.methods.clone(),
            threshold: options.threshold,
            results,
            overall_pass,
            overall_score,
        },
        diff,
        images: pair,
    })
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn display_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
