use std::path::{Path, PathBuf};

use prt_lib::config::{validate_region, validate_threshold};
use prt_lib::{
    ArtifactOptions, CompareOptions, ComparisonMethod, Config, DiffStyle, DuplicateXpathPolicy,
    IgnoreRegion, LayoutComparator, PrtError, StructureInputs,
};

use crate::cli::{CompareArgs, LayoutArgs};

/// Resolved settings for the compare command after merging CLI args and config.
#[derive(Debug, Clone)]
pub struct ResolvedCompareSettings {
    pub options: CompareOptions,
    pub artifacts: ArtifactOptions,
    pub output_dir: PathBuf,
}

/// Merge compare flags over the config file; flags win when present.
pub fn resolve_compare_settings(
    args: &CompareArgs,
    config: &Config,
) -> Result<ResolvedCompareSettings, PrtError> {
    let mut options = config.compare_options();

    if let Some(methods) = args.method.as_deref() {
        options.methods = parse_methods(methods)?;
    }
    if let Some(threshold) = args.threshold {
        options.threshold = validate_threshold(threshold)?;
    }
    if let Some(color_threshold) = args.color_threshold {
        options.color_threshold = parse_color_threshold(color_threshold)?;
    }
    if args.include_antialiasing {
        options.ignore_antialiasing = false;
    }
    if let Some(regions) = args.ignore_regions.as_deref() {
        options.ignore_regions = parse_ignore_regions(regions)?;
    }
    if let (Some(baseline), Some(current)) = (&args.baseline_snapshot, &args.current_snapshot) {
        options.structure = Some(StructureInputs {
            baseline: baseline.clone(),
            current: current.clone(),
            duplicates: args
                .duplicates
                .map(DuplicateXpathPolicy::from)
                .unwrap_or(config.layout.duplicates),
        });
    }

    let diff_style = match args.diff_style.as_deref() {
        Some(style) => style.parse::<DiffStyle>()?,
        None => config.diff_style,
    };

    Ok(ResolvedCompareSettings {
        options,
        artifacts: ArtifactOptions {
            diff_style,
            text_report: config.text_report && !args.disable_txt,
            json_report: config.json_report && !args.disable_json,
        },
        output_dir: args
            .output
            .clone()
            .unwrap_or_else(|| config.output_dir.clone()),
    })
}

/// Layout comparator configured from flags over the config file.
pub fn resolve_layout_settings(
    args: &LayoutArgs,
    config: &Config,
) -> Result<LayoutComparator, PrtError> {
    Ok(LayoutComparator {
        threshold: match args.threshold {
            Some(threshold) => validate_threshold(threshold)?,
            None => config.layout.threshold,
        },
        duplicates: args
            .duplicates
            .map(DuplicateXpathPolicy::from)
            .unwrap_or(config.layout.duplicates),
    })
}

/// Parse a comma-separated method list such as `pixel,ssim`.
pub fn parse_methods(raw: &str) -> Result<Vec<ComparisonMethod>, PrtError> {
    let methods = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::parse::<ComparisonMethod>)
        .collect::<Result<Vec<_>, _>>()?;
    if methods.is_empty() {
        return Err(PrtError::Config(
            "At least one comparison method is required".to_string(),
        ));
    }
    Ok(methods)
}

/// Parse ignore regions in the form `X,Y,W,H;X,Y,W,H`. Empty segments are skipped.
pub fn parse_ignore_regions(raw: &str) -> Result<Vec<IgnoreRegion>, PrtError> {
    raw.split(';')
        .map(str::trim)
        .filter(|region| !region.is_empty())
        .map(parse_ignore_region)
        .collect()
}

fn parse_ignore_region(raw: &str) -> Result<IgnoreRegion, PrtError> {
    let format_error = || {
        PrtError::Config(format!(
            "Invalid ignore region format: {raw}. Expected format: X,Y,WIDTH,HEIGHT (e.g., 0,0,100,50)"
        ))
    };

    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format_error())?;
    let [x, y, width, height] = parts[..] else {
        return Err(format_error());
    };
    if width <= 0 || height <= 0 {
        return Err(PrtError::Config(
            "Invalid ignore region: width and height must be positive numbers".to_string(),
        ));
    }

    let region = IgnoreRegion::new(
        i32::try_from(x).map_err(|_| format_error())?,
        i32::try_from(y).map_err(|_| format_error())?,
        u32::try_from(width).map_err(|_| format_error())?,
        u32::try_from(height).map_err(|_| format_error())?,
    );
    validate_region(&region)?;
    Ok(region)
}

fn parse_color_threshold(value: i64) -> Result<u8, PrtError> {
    u8::try_from(value).map_err(|_| {
        PrtError::Config(format!(
            "Color threshold must be between 0 and 255, got {value}"
        ))
    })
}

/// Load config from an explicit path, `./prt.toml`, or defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, PrtError> {
    Config::load(path)
}

/// Format effective compare settings as a single-line string.
pub fn format_effective_config(settings: &ResolvedCompareSettings, source: Option<&Path>) -> String {
    let source = source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| {
            if Config::default_path().exists() {
                Config::default_path().display().to_string()
            } else {
                "defaults".to_string()
            }
        });
    let options = &settings.options;
    let methods = options
        .methods
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "Effective config [{source}]: methods={methods}, threshold={}, color_threshold={}, ignore_antialiasing={}, ignore_regions={}, diff_style={}, output={}",
        options.threshold,
        options.color_threshold,
        options.ignore_antialiasing,
        options.ignore_regions.len(),
        settings.artifacts.diff_style,
        settings.output_dir.display()
    )
}
