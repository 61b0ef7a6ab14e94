use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

use prt_lib::{ErrorOutput, LayoutStatus, PrtError, PrtOutput, PRT_OUTPUT_VERSION};

use crate::cli::OutputFormat;

/// Write a payload to stdout in the requested format.
pub fn write_output(body: &PrtOutput, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(body)?),
        OutputFormat::Pretty => write_pretty_output(body)?,
    };
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: PrtError, format: OutputFormat) -> ExitCode {
    tracing::debug!(target: "prt", "fatal error: {err:?}");
    let error_payload = err.to_payload();
    let payload = PrtOutput::Error(ErrorOutput {
        version: PRT_OUTPUT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            println!("{content}");
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    // Reserve exit code 2 for fatal errors; threshold failures use 1.
    ExitCode::from(2)
}

/// Human text on a terminal, pretty JSON otherwise.
fn write_pretty_output(body: &PrtOutput) -> io::Result<()> {
    if std::io::stdout().is_terminal() {
        println!("{}", format_pretty(body, true));
        return Ok(());
    }

    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    println!("{content}");
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &PrtOutput, colorize: bool) -> String {
    match body {
        PrtOutput::Compare(out) => {
            let result = &out.result;
            let mut buf = String::new();
            writeln!(
                buf,
                "{} Page regression check",
                status(result.overall_pass, colorize)
            )
            .ok();
            let score = format!("{:.2}%", result.overall_score * 100.0);
            writeln!(
                buf,
                "Score: {} (threshold {})",
                color(&score, score_color_code(result.overall_score), colorize),
                result.threshold
            )
            .ok();

            let mut lines: Vec<String> = Vec::new();
            if let Some(pixel) = &result.results.pixel {
                lines.push(format!(
                    "- {:10} {} pixels ({:.4}%), max color diff {} {}",
                    "pixel",
                    pixel.pixel_diff_count,
                    pixel.pixel_diff_ratio * 100.0,
                    pixel.max_color_diff,
                    status(pixel.pass, colorize)
                ));
            }
            if let Some(ssim) = &result.results.ssim {
                lines.push(format!(
                    "- {:10} {:.4} (diff {:.4}) {}",
                    "ssim",
                    ssim.ssim_score,
                    ssim.ssim_diff_ratio,
                    status(ssim.pass, colorize)
                ));
            }
            if let Some(layout) = &result.results.structure {
                lines.push(format!(
                    "- {:10} {} added, {} removed, {} moved, {} resized (informational)",
                    "layout",
                    layout.added_elements,
                    layout.removed_elements,
                    layout.moved_elements,
                    layout.resized_elements
                ));
            }
            if !lines.is_empty() {
                writeln!(buf, "Methods:").ok();
                for line in lines {
                    writeln!(buf, "{line}").ok();
                }
            }

            let art = &out.artifacts;
            let mut paths = Vec::new();
            if let Some(p) = &art.diff_image {
                paths.push(("diffImage", p));
            }
            if let Some(p) = &art.heatmap {
                paths.push(("heatmap", p));
            }
            if let Some(p) = &art.result_json {
                paths.push(("resultJson", p));
            }
            if let Some(p) = &art.result_txt {
                paths.push(("resultTxt", p));
            }
            if !paths.is_empty() {
                writeln!(buf, "Artifacts:").ok();
                for (label, path) in paths {
                    writeln!(buf, "- {:12} {}", label, path.display()).ok();
                }
            }
            buf
        }
        PrtOutput::Layout(out) => {
            let result = &out.result;
            let mut buf = String::new();
            writeln!(buf, "{} Layout check", status(result.pass, colorize)).ok();
            writeln!(
                buf,
                "{} added, {} removed, {} moved, {} resized",
                result.added_elements,
                result.removed_elements,
                result.moved_elements,
                result.resized_elements
            )
            .ok();
            writeln!(
                buf,
                "Max shift: {:.2}px, diff ratio: {:.4}%",
                result.max_shift,
                result.layout_diff_ratio * 100.0
            )
            .ok();

            let changed: Vec<_> = result
                .layout_diffs
                .iter()
                .filter(|d| d.status != LayoutStatus::Unchanged)
                .take(10)
                .collect();
            if !changed.is_empty() {
                writeln!(buf, "Changes (max 10):").ok();
                for diff in changed {
                    let label = serde_json::to_value(diff.status)
                        .ok()
                        .and_then(|v| v.as_str().map(str::to_string))
                        .unwrap_or_default();
                    writeln!(buf, "- [{label}] {} ({})", diff.selector, diff.xpath).ok();
                }
            }
            buf
        }
        PrtOutput::Error(out) => {
            let mut buf = String::new();
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or(out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
            buf
        }
    }
}

fn status(pass: bool, colorize: bool) -> String {
    if pass {
        color("PASS", "32", colorize)
    } else {
        color("FAIL", "31", colorize)
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Map score to ANSI color code.
fn score_color_code(score: f64) -> &'static str {
    if score >= 0.99 {
        "32" // green
    } else if score >= 0.85 {
        "33" // yellow
    } else {
        "31" // red
    }
}

/// Exit code for a finished comparison: 0 pass, 1 threshold failure.
pub fn exit_code_for_compare(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
