//! `prt.toml` configuration.
//!
//! Every key is optional; missing keys fall back to the built-in defaults.
//! Command-line flags are overlaid on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diff_image::DiffStyle;
use crate::error::PrtError;
use crate::metrics::{CompareOptions, DuplicateXpathPolicy, WindowBounds};
use crate::types::{ComparisonMethod, IgnoreRegion};
use crate::Result;

pub const CONFIG_FILE: &str = "prt.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Maximum diff ratio that still passes (0.0 - 1.0)
    pub threshold: f64,
    /// Per-pixel color tolerance (0 - 255)
    pub color_threshold: u8,
    pub ignore_antialiasing: bool,
    pub methods: Vec<ComparisonMethod>,
    pub diff_style: DiffStyle,
    /// Leave identical pixels transparent in the diff image
    pub diff_mask: bool,
    pub ssim_window: WindowBounds,
    pub ignore_regions: Vec<IgnoreRegion>,
    pub output_dir: PathBuf,
    pub text_report: bool,
    pub json_report: bool,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub threshold: f64,
    pub duplicates: DuplicateXpathPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: 0.002,
            color_threshold: 10,
            ignore_antialiasing: true,
            methods: vec![ComparisonMethod::Pixel],
            diff_style: DiffStyle::Heatmap,
            diff_mask: true,
            ssim_window: WindowBounds::Image,
            ignore_regions: Vec::new(),
            output_dir: PathBuf::from("./tmp/diff/"),
            text_report: true,
            json_report: true,
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            threshold: 0.002,
            duplicates: DuplicateXpathPolicy::Last,
        }
    }
}

impl Config {
    /// Load from `path`, or from `./prt.toml` when it exists, or use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            PrtError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| PrtError::Config(format!("{} ({})", config_message(e), path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| PrtError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    /// Check constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)?;
        validate_threshold(self.layout.threshold)
            .map_err(|e| PrtError::Config(format!("layout.{}", config_message(e))))?;
        if self.methods.is_empty() {
            return Err(PrtError::Config(
                "At least one comparison method is required".to_string(),
            ));
        }
        for region in &self.ignore_regions {
            validate_region(region)?;
        }
        Ok(())
    }

    /// Engine options for an image comparison with this configuration.
    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            methods: self.methods.clone(),
            threshold: self.threshold,
            color_threshold: self.color_threshold,
            ignore_antialiasing: self.ignore_antialiasing,
            ignore_regions: self.ignore_regions.clone(),
            diff_mask: self.diff_mask,
            window_bounds: self.ssim_window,
            structure: None,
        }
    }
}

pub fn validate_threshold(value: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(PrtError::Config(format!(
            "threshold must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(value)
}

pub fn validate_region(region: &IgnoreRegion) -> Result<()> {
    if region.width == 0 || region.height == 0 {
        return Err(PrtError::Config(format!(
            "Invalid ignore region {},{},{},{}: width and height must be > 0",
            region.x, region.y, region.width, region.height
        )));
    }
    Ok(())
}

fn config_message(err: PrtError) -> String {
    match err {
        PrtError::Config(msg) => msg,
        other => other.to_string(),
    }
}
