//! Configuration loader for asmblive
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from multiple sources with proper precedence.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "ASMBLIVE_CONFIG_DIR";

/// Environment variable for specific configuration file
const CONFIG_FILE_ENV: &str = "ASMBLIVE_CONFIG_FILE";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "ASMBLIVE";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Configuration loader that handles layered configuration loading
///
/// The loader supports the following configuration sources (in order of priority):
/// 1. `default.toml` - Base default configuration
/// 2. `{environment}.toml` - Environment-specific configuration (optional)
/// 3. `local.toml` - Local development overrides (optional)
/// 4. `ASMBLIVE_*` environment variables (highest priority)
///
/// `default.toml` is required only when `ASMBLIVE_CONFIG_DIR` names the
/// directory explicitly; the implicit `./config` may be absent, in which
/// case built-in defaults apply.
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// Set when `ASMBLIVE_CONFIG_DIR` chose the directory
    explicit_dir: bool,
    /// Specific configuration file path (if set, skips layered loading)
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a new configuration loader
    ///
    /// This reads environment variables to determine:
    /// - Configuration directory (`ASMBLIVE_CONFIG_DIR`)
    /// - Specific configuration file (`ASMBLIVE_CONFIG_FILE`)
    /// - Application environment (`ASMBLIVE_APP_ENV`)
    ///
    /// # Errors
    ///
    /// Returns an error if both `ASMBLIVE_CONFIG_DIR` and `ASMBLIVE_CONFIG_FILE`
    /// are set, as they are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let env_dir = std::env::var(CONFIG_DIR_ENV).ok();
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && env_dir.is_some() {
            return Err(ConfigError::mutual_exclusivity(
                "ASMBLIVE_CONFIG_DIR and ASMBLIVE_CONFIG_FILE cannot both be set. \
                 Use ASMBLIVE_CONFIG_DIR for layered configuration or \
                 ASMBLIVE_CONFIG_FILE for a single configuration file.",
            ));
        }

        Ok(Self {
            explicit_dir: env_dir.is_some(),
            config_dir: env_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads only `path` (plus environment overrides), as if
    /// `ASMBLIVE_CONFIG_FILE` named it.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Overrides the environment read from `ASMBLIVE_APP_ENV`.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Load configuration from all sources
    ///
    /// If `ASMBLIVE_CONFIG_FILE` is set, loads only that file.
    /// Otherwise, performs layered loading from the configuration directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a required file is missing
    /// - configuration parsing fails
    /// - configuration validation fails
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {e}"))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = if let Some(ref config_file) = self.config_file {
            Self::add_file_source(builder, config_file, true)?
        } else {
            self.build_layered_config(builder)?
        };

        // ASMBLIVE_PROXY__DEFAULT_PORT -> proxy.default_port
        let builder = Self::add_env_source(builder);

        builder.build().map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let default_path = self.config_dir.join("default.toml");
        let builder = Self::add_file_source(builder, &default_path, self.explicit_dir)?;

        let env_path = self
            .config_dir
            .join(format!("{}.toml", self.environment.as_str()));
        let builder = Self::add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        Self::add_file_source(builder, &local_path, false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        let Some(name) = path.to_str() else {
            return Err(ConfigError::ParseError(format!(
                "Configuration path is not valid UTF-8: {}",
                path.display()
            )));
        };

        Ok(builder.add_source(File::new(name, FileFormat::Toml).required(required)))
    }

    /// Environment variables with prefix `ASMBLIVE_` are mapped to configuration
    /// keys, with `__` separating nested keys:
    /// - `ASMBLIVE_SERVER__PORT` -> `server.port`
    /// - `ASMBLIVE_PLATFORMS__BILIBILI__API_BASE` -> `platforms.bilibili.api_base`
    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            explicit_dir: false,
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}
