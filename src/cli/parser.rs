//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Live room resolver with a local CORS proxy
#[derive(Parser, Debug)]
#[command(name = "asmblive")]
#[command(about = "Live room resolver with a local CORS proxy")]
#[command(long_about = "
asmblive resolves live rooms on streaming platforms (room info, qualities and
stream URLs) and runs a loopback reverse proxy that lets a browser load
images and streams from hosts that do not send CORS headers.

EXAMPLES:
    # Start the API server and the proxy with default configuration
    asmblive serve

    # Start on a custom host and port
    asmblive serve --host 0.0.0.0 --port 8080

    # Use a custom configuration file
    asmblive --config /path/to/config.toml serve

    # Check configuration without starting anything
    asmblive serve --dry-run

    # Resolve a bilibili room and print it as JSON
    asmblive resolve bili 5441

    # Print the stream URLs of one quality
    asmblive resolve bili 5441 --quality 10000

For more information about configuration options, see config/default.toml.
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this TOML file instead of the layered files under ./config.
    /// ASMBLIVE_* environment variables still override its values.
    ///
    /// Example: --config /etc/asmblive/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which config/{environment}.toml is layered over the defaults,
    /// taking precedence over ASMBLIVE_APP_ENV.
    ///
    /// Available values: development (dev), test, staging (stage), production (prod)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    ///
    /// Increases log output to debug level.
    /// Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Reduces log output to error level only.
    /// Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server and the proxy (default)
    ///
    /// Opens the stores, starts the loopback proxy on the first free port at
    /// or above proxy.default_port and serves the HTTP API until Ctrl+C.
    ///
    /// Examples:
    ///   asmblive serve                           # Start with defaults
    ///   asmblive serve --host 0.0.0.0 --port 80  # Bind to all interfaces on port 80
    ///   asmblive serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        ///
        /// Use 127.0.0.1 for localhost only, or 0.0.0.0 to accept connections
        /// from any interface.
        ///
        /// Default: 127.0.0.1
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        ///
        /// Must be between 1 and 65535.
        ///
        /// Default: 3000
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override
        ///
        /// Overrides both configuration file settings and global --verbose/--quiet flags.
        ///
        /// Available levels: error, warn, info, debug, trace
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        ///
        /// Returns exit code 0 if valid, non-zero if invalid.
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve a live room and print it as JSON
    ///
    /// Prints the room followed by its qualities. With --quality, prints the
    /// stream URLs of that quality instead of the qualities. The proxy is not
    /// started, so image URLs are printed as the platform returned them.
    ///
    /// Examples:
    ///   asmblive resolve bili 5441
    ///   asmblive resolve bili 528 --quality 10000
    Resolve {
        /// Platform id, e.g. bili
        #[arg(value_name = "PLATFORM")]
        platform: String,

        /// Canonical room id or alias
        #[arg(value_name = "ROOM_ID", value_parser = super::validation::validate_room_id)]
        room_id: String,

        /// Quality id whose stream URLs should be printed
        #[arg(short = 'Q', long, value_name = "QUALITY")]
        quality: Option<String>,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Validate CLI arguments and provide detailed error messages
    ///
    /// This method performs additional validation beyond what clap provides.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Resolve { quality, .. }) = &self.command
            && quality.as_deref().is_some_and(|q| q.trim().is_empty())
        {
            return Err("--quality must not be empty".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }

    /// Get detailed help for validation errors
    pub fn get_validation_help() -> &'static str {
        r#"
Common validation errors and solutions:

Port validation:
  - Port must be between 1 and 65535
  - Ports below 1024 require root privileges on most systems
  - Example: --port 8080

Host validation:
  - Use 'localhost' or '127.0.0.1' for local access only
  - Use '0.0.0.0' to accept connections from any interface
  - IPv4 addresses must be in valid format (e.g., 192.168.1.100)
  - Example: --host 0.0.0.0

Configuration file validation:
  - File must exist and be readable
  - File must be in TOML format
  - Example: --config /path/to/config.toml

Room id validation:
  - Must not be empty or contain whitespace
  - Example: asmblive resolve bili 5441

For more help, use: asmblive help <subcommand>
"#
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_flag() {
        let err = Cli::try_parse_from(["asmblive", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["asmblive", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["asmblive"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from(["asmblive", "serve", "--host", "0.0.0.0", "--port", "8080"])
            .unwrap();
        let Some(Commands::Serve {
            host,
            port,
            log_level,
            dry_run,
        }) = cli.command
        else {
            panic!("Expected Serve command");
        };
        assert_eq!(host.as_deref(), Some("0.0.0.0"));
        assert_eq!(port, Some(8080));
        assert!(log_level.is_none());
        assert!(!dry_run);
    }

    #[test]
    fn test_serve_rejects_port_zero() {
        assert!(Cli::try_parse_from(["asmblive", "serve", "--port", "0"]).is_err());
    }

    #[test]
    fn test_resolve_command() {
        let cli = Cli::try_parse_from(["asmblive", "resolve", "bili", "528", "--quality", "10000"])
            .unwrap();
        let Some(Commands::Resolve {
            platform,
            room_id,
            quality,
        }) = cli.command
        else {
            panic!("Expected Resolve command");
        };
        assert_eq!(platform, "bili");
        assert_eq!(room_id, "528");
        assert_eq!(quality.as_deref(), Some("10000"));
    }

    #[test]
    fn test_resolve_requires_room_id() {
        let err = Cli::try_parse_from(["asmblive", "resolve", "bili"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_resolve_empty_quality_fails_validation() {
        let cli = Cli::try_parse_from(["asmblive", "resolve", "bili", "5441", "-Q", " "]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_env_aliases() {
        let cli = Cli::try_parse_from(["asmblive", "--env", "stage"]).unwrap();
        assert!(matches!(cli.env, Some(Environment::Staging)));
        assert_eq!(
            crate::config::Environment::from(Environment::Production),
            crate::config::Environment::Production
        );
    }

    #[test]
    fn test_verbose_flag() {
        let cli = Cli::try_parse_from(["asmblive", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["asmblive", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
