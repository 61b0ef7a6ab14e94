//! Output payloads and on-disk artifacts.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diff_image::{render_diff_image, DiffStyle};
use crate::error::ErrorPayload;
use crate::image_loader::encode_png;
use crate::metrics::ComparisonRun;
use crate::types::{ComparisonResult, LayoutComparisonResult};
use crate::Result;

/// Schema version for stdout payloads.
pub const PRT_OUTPUT_VERSION: &str = "0.1.0";

pub const RESULT_JSON: &str = "result.json";
pub const RESULT_TXT: &str = "result.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PrtOutput {
    Compare(CompareOutput),
    Layout(LayoutOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareOutput {
    pub version: String,
    pub result: ComparisonResult,
    pub artifacts: CompareArtifacts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOutput {
    pub version: String,
    pub baseline: String,
    pub current: String,
    pub result: LayoutComparisonResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}

/// Files written for one comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareArtifacts {
    pub directory: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_json: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_txt: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_image: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmap: Option<PathBuf>,
}

/// Which artifacts to write and how to render the diff.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactOptions {
    pub diff_style: DiffStyle,
    pub text_report: bool,
    pub json_report: bool,
}

impl Default for ArtifactOptions {
    fn default() -> Self {
        Self {
            diff_style: DiffStyle::Heatmap,
            text_report: true,
            json_report: true,
        }
    }
}

/// Short human summary written to `result.txt`.
///
/// Per-method lines are only added when the overall verdict is FAIL.
pub fn text_report(result: &ComparisonResult) -> String {
    let mut buf = String::new();
    writeln!(
        buf,
        "result: {}",
        if result.overall_pass { "PASS" } else { "FAIL" }
    )
    .ok();
    writeln!(buf, "score: {:.2}%", result.overall_score * 100.0).ok();
    writeln!(buf, "timestamp: {}", result.timestamp).ok();

    if !result.overall_pass {
        if let Some(pixel) = result.results.pixel.as_ref().filter(|p| !p.pass) {
            writeln!(buf, "pixel: {:.2}% diff", pixel.pixel_diff_ratio * 100.0).ok();
        }
        if let Some(ssim) = result.results.ssim.as_ref().filter(|s| !s.pass) {
            writeln!(buf, "ssim: {:.4}", ssim.ssim_score).ok();
        }
    }
    buf
}

/// Write diff images and reports for a finished comparison into `dir`.
///
/// Diff images are only produced when the pixel method ran. A non-heatmap
/// style also writes the raw heatmap next to it.
pub fn write_comparison_artifacts(
    dir: &Path,
    run: &ComparisonRun,
    options: ArtifactOptions,
) -> Result<CompareArtifacts> {
    std::fs::create_dir_all(dir)?;
    let mut artifacts = CompareArtifacts {
        directory: dir.to_path_buf(),
        ..Default::default()
    };

    if let Some(diff) = &run.diff {
        let style = options.diff_style;
        let bytes = render_diff_image(style, &run.images, diff)?;
        let diff_path = dir.join(style.file_name());
        std::fs::write(&diff_path, bytes)?;
        artifacts.diff_image = Some(diff_path);

        if style != DiffStyle::Heatmap {
            let heatmap_path = dir.join(DiffStyle::Heatmap.file_name());
            std::fs::write(&heatmap_path, encode_png(diff)?)?;
            artifacts.heatmap = Some(heatmap_path);
        }
    }

    if options.text_report {
        let path = dir.join(RESULT_TXT);
        std::fs::write(&path, text_report(&run.result))?;
        artifacts.result_txt = Some(path);
    }

    if options.json_report {
        let path = dir.join(RESULT_JSON);
        std::fs::write(&path, serde_json::to_string_pretty(&run.result)?)?;
        artifacts.result_json = Some(path);
    }

    Ok(artifacts)
}

/// Write a layout result as pretty JSON, creating parent directories.
pub fn write_layout_result(path: &Path, result: &LayoutComparisonResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(result)?)?;
    Ok(())
}
