//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{ResolveCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};

/// Execute a CLI command with the given settings
///
/// No subcommand means `serve`.
///
/// # Errors
/// Returns errors from command handlers or validation failures
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
        Some(Commands::Resolve {
            platform,
            room_id,
            quality,
        }) => {
            ResolveCommandHandler::from_settings(&settings)
                .await?
                .execute(platform, room_id, quality.as_deref())
                .await
        }
    }
}

/// Validate command arguments before execution
fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    if let Some(Commands::Serve {
        host: Some(host),
        port: Some(port),
        ..
    }) = &cli.command
        && *port < 1024
        && host == "0.0.0.0"
    {
        eprintln!("Warning: Binding to 0.0.0.0 on port {port} requires root privileges");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parser::Cli;
    use clap::Parser;
    use tempfile::TempDir;

    fn create_valid_config(dir: &TempDir) -> Settings {
        let mut config = Settings::default();
        config.store.directory = dir.path().to_string_lossy().into_owned();
        config.platforms.bilibili.enabled = false;
        config
    }

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from(["asmblive", "serve", "--dry-run"]).unwrap();

        let result = execute_command(&cli, create_valid_config(&dir)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_execute_resolve_unknown_platform() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from(["asmblive", "resolve", "bili", "5441"]).unwrap();

        let result = execute_command(&cli, create_valid_config(&dir)).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[test]
    fn test_validate_command_args() {
        let cli = Cli::try_parse_from(["asmblive", "serve", "--port", "8080"]).unwrap();
        assert!(validate_command_args(&cli).is_ok());
    }

    #[test]
    fn test_validate_conflicting_args() {
        let cli = Cli {
            command: None,
            config: None,
            env: None,
            verbose: true,
            quiet: true,
        };
        assert!(matches!(
            validate_command_args(&cli),
            Err(AppError::Validation { .. })
        ));
    }
}
