use std::process::ExitCode;

use asmblive::cli::{Cli, execute_command, init_logger_from_settings, load_and_merge_config};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_and_merge_config(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            eprintln!("{}", Cli::get_validation_help());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logger_from_settings(&settings) {
        eprintln!("Logger initialization error: {e:#}");
        return ExitCode::FAILURE;
    }

    match execute_command(&cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
