mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_compare, run_layout};
use tracing_subscriber::EnvFilter;

/// Log filter override; falls back to `RUST_LOG`.
const LOG_ENV: &str = "PRT_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Compare(compare) => run_compare(args.config, args.verbose, compare).await,
        Commands::Layout(layout) => run_layout(args.config, layout).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "prt=debug" } else { "prt=info" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
