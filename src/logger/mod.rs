//! Logger built on `tracing-subscriber`.
//!
//! - Console output on stderr, colored only on a terminal
//! - File output in full, compact or JSON format
//! - Size based file rotation

pub mod config;
pub mod error;
mod rotation;
mod writer;


pub use config::*;
pub use error::LoggerError;
pub use writer::RotatingFileWriter;

use std::io::IsTerminal;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber described by `config`.
///
/// `RUST_LOG` is not consulted; the configured level applies to every target.
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match (config.console.enabled, config.file.enabled) {
        (true, true) => init_both(&config, filter)?,
        (true, false) => init_console_only(&config.console, filter)?,
        (false, true) => init_file_only(&config.file, filter)?,
        (false, false) => anyhow::bail!("At least one output (console or file) must be enabled"),
    }

    Ok(())
}

fn use_ansi(config: &ConsoleConfig) -> bool {
    config.colored && std::io::stderr().is_terminal()
}

fn init_console_only(config: &ConsoleConfig, filter: EnvFilter) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(use_ansi(config))
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}

fn init_file_only(config: &FileConfig, filter: EnvFilter) -> anyhow::Result<()> {
    let writer = RotatingFileWriter::new(config)?;
    let base = fmt::layer().with_ansi(false).with_target(true).with_writer(writer);

    match config.format {
        LogFormat::Full => tracing_subscriber::registry()
            .with(filter)
            .with(base)
            .try_init()?,
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(base.compact())
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(base.json())
            .try_init()?,
    }
    Ok(())
}

fn init_both(config: &LoggerConfig, filter: EnvFilter) -> anyhow::Result<()> {
    let writer = RotatingFileWriter::new(&config.file)?;

    // The file layer goes first so the console layer's ANSI setting does not
    // leak escape codes into span fields written to the file.
    // See: https://github.com/tokio-rs/tracing/issues/1817
    let file_layer = fmt::layer().with_ansi(false).with_target(true).with_writer(writer);
    let ansi = use_ansi(&config.console);

    match config.file.format {
        LogFormat::Full => tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(
                fmt::layer()
                    .with_ansi(ansi)
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(file_layer.compact())
            .with(
                fmt::layer()
                    .with_ansi(ansi)
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(file_layer.json())
            .with(
                fmt::layer()
                    .with_ansi(ansi)
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }
    Ok(())
}
