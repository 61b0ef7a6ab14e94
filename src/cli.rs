use clap::{Parser, Subcommand, ValueEnum};
use prt_lib::DuplicateXpathPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prt")]
#[command(
    version,
    about = "Page Regression Tester - Compare page renders against a stored baseline",
    long_about = "Page Regression Tester (PRT)\n\nModes:\n- compare: pixel and SSIM comparison of two screenshots, with diff images and reports.\n- layout: element geometry comparison of two structure snapshots.\n\nExit codes: 0 pass, 1 threshold failure, 2 error.\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose (debug) logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Config file (TOML); defaults to ./prt.toml when present. CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two screenshots and generate diff images
    Compare(CompareArgs),

    /// Compare the element geometry of two structure snapshots
    Layout(LayoutArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(help = "Baseline image path")]
    pub baseline: PathBuf,

    #[arg(help = "Current image path")]
    pub current: PathBuf,

    #[arg(
        long,
        short,
        value_name = "DIR",
        help = "Output directory for diff images and reports [default: ./tmp/diff/]"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "METHODS",
        help = "Comparison methods (comma-separated: pixel,ssim) [default: pixel]"
    )]
    pub method: Option<String>,

    #[arg(long, help = "Diff threshold (0.0-1.0) [default: 0.002]")]
    pub threshold: Option<f64>,

    #[arg(
        long,
        value_name = "STYLE",
        help = "Diff image style (heatmap|sidebyside|overlay|blend) [default: heatmap]"
    )]
    pub diff_style: Option<String>,

    #[arg(
        long,
        value_name = "REGIONS",
        help = "Ignore regions (X,Y,W,H separated by semicolon)"
    )]
    pub ignore_regions: Option<String>,

    #[arg(
        long,
        help = "Include antialiasing in diff detection (ignored by default)"
    )]
    pub include_antialiasing: bool,

    #[arg(long, help = "Color diff threshold (0-255) [default: 10]")]
    pub color_threshold: Option<i64>,

    #[arg(
        long,
        value_name = "PATH",
        requires = "current_snapshot",
        help = "Baseline structure snapshot; adds a layout result to the report"
    )]
    pub baseline_snapshot: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        requires = "baseline_snapshot",
        help = "Current structure snapshot"
    )]
    pub current_snapshot: Option<PathBuf>,

    #[arg(long, value_enum, help = "Handling of repeated xpaths in snapshots")]
    pub duplicates: Option<DuplicatesArg>,

    #[arg(long, help = "Disable text report output (enabled by default)")]
    pub disable_txt: bool,

    #[arg(long, help = "Disable JSON result output (enabled by default)")]
    pub disable_json: bool,

    #[arg(long, value_enum, default_value = "json", help = "Stdout format")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug, Clone)]
pub struct LayoutArgs {
    #[arg(help = "Baseline structure snapshot (JSON)")]
    pub baseline: PathBuf,

    #[arg(help = "Current structure snapshot (JSON)")]
    pub current: PathBuf,

    #[arg(long, help = "Layout diff ratio threshold (0.0-1.0) [default: 0.002]")]
    pub threshold: Option<f64>,

    #[arg(long, value_enum, help = "Handling of repeated xpaths [default: last]")]
    pub duplicates: Option<DuplicatesArg>,

    #[arg(long, short, value_name = "FILE", help = "Also write the layout result to this file")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "json", help = "Stdout format")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DuplicatesArg {
    Last,
    First,
    Reject,
}

impl From<DuplicatesArg> for DuplicateXpathPolicy {
    fn from(arg: DuplicatesArg) -> Self {
        match arg {
            DuplicatesArg::Last => DuplicateXpathPolicy::Last,
            DuplicatesArg::First => DuplicateXpathPolicy::First,
            DuplicatesArg::Reject => DuplicateXpathPolicy::Reject,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, DuplicatesArg, OutputFormat};
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn compare_command_uses_defaults() {
        let cli = Cli::parse_from(["prt", "compare", "baseline.png", "current.png"]);

        assert!(!cli.verbose);
        assert!(cli.config.is_none());

        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.baseline, Path::new("baseline.png"));
                assert_eq!(args.current, Path::new("current.png"));
                assert!(args.output.is_none());
                assert!(args.method.is_none());
                assert!(args.threshold.is_none());
                assert!(args.diff_style.is_none());
                assert!(args.ignore_regions.is_none());
                assert!(!args.include_antialiasing);
                assert!(args.color_threshold.is_none());
                assert!(args.baseline_snapshot.is_none());
                assert!(!args.disable_txt);
                assert!(!args.disable_json);
                assert!(matches!(args.format, OutputFormat::Json));
            }
            _ => panic!("expected compare command"),
        }
    }

    #[test]
    fn compare_command_respects_overrides() {
        let cli = Cli::parse_from([
            "prt",
            "--verbose",
            "compare",
            "a.png",
            "b.png",
            "-o",
            "out",
            "--method",
            "pixel,ssim",
            "--threshold",
            "0.05",
            "--diff-style",
            "blend",
            "--ignore-regions",
            "0,0,100,50;1340,0,100,50",
            "--include-antialiasing",
            "--color-threshold",
            "25",
            "--baseline-snapshot",
            "a.json",
            "--current-snapshot",
            "b.json",
            "--duplicates",
            "first",
            "--disable-txt",
            "--disable-json",
            "--format",
            "pretty",
            "--config",
            "prt.toml",
        ]);

        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some(Path::new("prt.toml")));
        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.output.as_deref(), Some(Path::new("out")));
                assert_eq!(args.method.as_deref(), Some("pixel,ssim"));
                assert_eq!(args.threshold, Some(0.05));
                assert_eq!(args.diff_style.as_deref(), Some("blend"));
                assert_eq!(
                    args.ignore_regions.as_deref(),
                    Some("0,0,100,50;1340,0,100,50")
                );
                assert!(args.include_antialiasing);
                assert_eq!(args.color_threshold, Some(25));
                assert_eq!(args.baseline_snapshot.as_deref(), Some(Path::new("a.json")));
                assert_eq!(args.current_snapshot.as_deref(), Some(Path::new("b.json")));
                assert_eq!(args.duplicates, Some(DuplicatesArg::First));
                assert!(args.disable_txt);
                assert!(args.disable_json);
                assert!(matches!(args.format, OutputFormat::Pretty));
            }
            _ => panic!("expected compare command with overrides"),
        }
    }

    #[test]
    fn snapshot_flags_must_be_paired() {
        let result = Cli::try_parse_from([
            "prt",
            "compare",
            "a.png",
            "b.png",
            "--baseline-snapshot",
            "a.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn layout_command_parses() {
        let cli = Cli::parse_from([
            "prt",
            "layout",
            "base.json",
            "cur.json",
            "--threshold",
            "0.1",
            "--duplicates",
            "reject",
            "--output",
            "layout.json",
        ]);

        match cli.command {
            Commands::Layout(args) => {
                assert_eq!(args.baseline, Path::new("base.json"));
                assert_eq!(args.threshold, Some(0.1));
                assert_eq!(args.duplicates, Some(DuplicatesArg::Reject));
                assert_eq!(args.output.as_deref(), Some(Path::new("layout.json")));
                assert!(matches!(args.format, OutputFormat::Json));
            }
            _ => panic!("expected layout command"),
        }
    }
}
