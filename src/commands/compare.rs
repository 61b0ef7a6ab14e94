use std::path::PathBuf;
use std::process::ExitCode;

use prt_lib::{
    compare_images, write_comparison_artifacts, CompareOutput, PrtError, PrtOutput,
    TracingReporter, PRT_OUTPUT_VERSION,
};

use crate::cli::CompareArgs;
use crate::formatting::{exit_code_for_compare, render_error, write_output};
use crate::settings::{format_effective_config, load_config, resolve_compare_settings};

/// Run the compare command.
pub async fn run_compare(config_path: Option<PathBuf>, verbose: bool, args: CompareArgs) -> ExitCode {
    let format = args.format;
    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format),
    };
    let resolved = match resolve_compare_settings(&args, &config) {
        Ok(resolved) => resolved,
        Err(err) => return render_error(err, format),
    };

    if verbose {
        tracing::debug!(
            target: "prt",
            "{}",
            format_effective_config(&resolved, config_path.as_deref())
        );
    }

    let baseline = args.baseline;
    let current = args.current;
    let job = tokio::task::spawn_blocking(move || {
        let run = compare_images(&baseline, &current, &resolved.options, &TracingReporter)?;
        let artifacts =
            write_comparison_artifacts(&resolved.output_dir, &run, resolved.artifacts)?;
        Ok::<_, PrtError>(CompareOutput {
            version: PRT_OUTPUT_VERSION.to_string(),
            result: run.result,
            artifacts,
        })
    })
    .await;

    let output = match job {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => return render_error(err, format),
        Err(join_err) => {
            return render_error(
                PrtError::Io(std::io::Error::other(format!(
                    "comparison task failed: {join_err}"
                ))),
                format,
            )
        }
    };

    let passed = output.result.overall_pass;
    if let Some(path) = &output.artifacts.result_json {
        tracing::info!(target: "prt", "Result written to {}", path.display());
    }
    if let Err(err) = write_output(&PrtOutput::Compare(output), format) {
        eprintln!("Failed to write output: {err}");
        return ExitCode::from(2);
    }

    exit_code_for_compare(passed)
}
