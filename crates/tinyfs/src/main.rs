//! TinyFS - Entry point

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use tinyfs::Cli;
use tinyfs_telemetry::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_config()) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match tinyfs::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Fatal error");
            ExitCode::FAILURE
        }
    }
}
