use std::path::PathBuf;
use std::process::ExitCode;

use prt_lib::{
    write_layout_result, LayoutOutput, PrtError, PrtOutput, TracingReporter, PRT_OUTPUT_VERSION,
};

use crate::cli::LayoutArgs;
use crate::formatting::{exit_code_for_compare, render_error, write_output};
use crate::settings::{load_config, resolve_layout_settings};

/// Run the layout command.
pub async fn run_layout(config_path: Option<PathBuf>, args: LayoutArgs) -> ExitCode {
    let format = args.format;
    let comparator = match load_config(config_path.as_deref())
        .and_then(|config| resolve_layout_settings(&args, &config))
    {
        Ok(comparator) => comparator,
        Err(err) => return render_error(err, format),
    };

    let baseline = args.baseline.clone();
    let current = args.current.clone();
    let job = tokio::task::spawn_blocking(move || {
        comparator.compare_files(&baseline, &current, &TracingReporter)
    })
    .await;

    let result = match job {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => return render_error(err, format),
        Err(join_err) => {
            return render_error(
                PrtError::Io(std::io::Error::other(format!(
                    "layout task failed: {join_err}"
                ))),
                format,
            )
        }
    };

    if let Some(path) = &args.output {
        if let Err(err) = write_layout_result(path, &result) {
            return render_error(err, format);
        }
    }

    let passed = result.pass;
    let body = PrtOutput::Layout(LayoutOutput {
        version: PRT_OUTPUT_VERSION.to_string(),
        baseline: args.baseline.display().to_string(),
        current: args.current.display().to_string(),
        result,
        result_path: args.output,
    });
    if let Err(err) = write_output(&body, format) {
        eprintln!("Failed to write output: {err}");
        return ExitCode::from(2);
    }

    exit_code_for_compare(passed)
}
