//! Configuration settings structures for asmblive
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::external::live::BILIBILI_API_BASE as DEFAULT_API_BASE;
use crate::external::user_agent::PROXY_USER_AGENT;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig, RotationConfig};
use crate::proxy::{DEFAULT_PROXY_PORT, ProxyConfig};
use crate::services::RewriteOptions;
use crate::store::{StoreError, default_store_dir};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "asmblive".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_proxy_port() -> u16 {
    DEFAULT_PROXY_PORT
}

fn default_resend_timeout() -> u64 {
    5
}

fn default_shutdown_grace_period() -> u64 {
    3
}

fn default_proxy_user_agent() -> String {
    PROXY_USER_AGENT.to_string()
}

fn default_max_body_size() -> usize {
    2 * 1024 * 1024 // 2MB
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/asmblive.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_max_files() -> usize {
    5
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ============================================================================
// Proxy Configuration
// ============================================================================

/// Local CORS proxy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    /// First port tried when the proxy starts; 0 lets the OS choose
    #[serde(default = "default_proxy_port")]
    pub default_port: u16,

    /// Upstream request timeout in seconds
    #[serde(default = "default_resend_timeout")]
    pub resend_timeout: u64,

    /// Seconds in-flight requests get to finish on stop
    #[serde(default = "default_shutdown_grace_period")]
    pub shutdown_grace_period: u64,

    /// User-Agent presented to origins
    #[serde(default = "default_proxy_user_agent")]
    pub user_agent: String,

    /// Largest request body forwarded, in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Route room covers and avatars through the proxy
    #[serde(default = "default_true")]
    pub rewrite_assets: bool,

    /// Route stream URLs through the proxy
    #[serde(default)]
    pub rewrite_live_urls: bool,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            default_port: default_proxy_port(),
            resend_timeout: default_resend_timeout(),
            shutdown_grace_period: default_shutdown_grace_period(),
            user_agent: default_proxy_user_agent(),
            max_body_size: default_max_body_size(),
            rewrite_assets: default_true(),
            rewrite_live_urls: false,
        }
    }
}

impl ProxySettings {
    pub fn to_proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            default_port: self.default_port,
            resend_timeout: Duration::from_secs(self.resend_timeout),
            shutdown_grace_period: Duration::from_secs(self.shutdown_grace_period),
            user_agent: self.user_agent.clone(),
            max_body_size: self.max_body_size,
        }
    }

    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            assets: self.rewrite_assets,
            live_urls: self.rewrite_live_urls,
        }
    }
}

// ============================================================================
// Platform Configuration
// ============================================================================

/// Bilibili resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilibiliSettings {
    /// Register the platform at startup
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the live web API
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for BilibiliSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            api_base: default_api_base(),
        }
    }
}

/// Live platforms known to the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformsConfig {
    #[serde(default)]
    pub bilibili: BilibiliSettings,
}

// ============================================================================
// Store Configuration
// ============================================================================

/// Persistent JSON store settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Directory holding the store files; empty selects the per-OS default
    #[serde(default)]
    pub directory: String,
}

impl StoreSettings {
    pub fn resolve_dir(&self) -> Result<PathBuf, StoreError> {
        if self.directory.trim().is_empty() {
            default_store_dir()
        } else {
            Ok(PathBuf::from(&self.directory))
        }
    }
}

// ============================================================================
// Logger Settings (compatible with existing LoggerConfig)
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// Rotation settings for file logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    /// Maximum file size in bytes before rotation
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Maximum number of rotated files to keep
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            max_files: default_max_files(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Rotation settings
    #[serde(default)]
    pub rotation: RotationSettings,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
            rotation: RotationSettings::default(),
        }
    }
}

/// Logger configuration settings (compatible with existing LoggerConfig)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console_config = self.console.into_console_config();
        let file_config = self.file.into_file_config()?;

        LoggerConfig::new(console_config, file_config, self.level)
            .map_err(|e| ConfigError::validation("logger", e.to_string()))
    }
}

impl ConsoleSettings {
    pub fn into_console_config(self) -> ConsoleConfig {
        ConsoleConfig::new(self.enabled, self.colored)
    }
}

impl FileSettings {
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self.parse_format()?;
        let rotation_config = self.rotation.into_rotation_config()?;

        FileConfig::new(
            self.enabled,
            PathBuf::from(self.path),
            self.append,
            format,
            rotation_config,
        )
        .map_err(|e| ConfigError::validation("logger.file", e.to_string()))
    }

    /// Parse the format string into LogFormat enum
    pub(crate) fn parse_format(&self) -> Result<LogFormat, ConfigError> {
        self.format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", e.to_string()))
    }
}

impl RotationSettings {
    pub fn into_rotation_config(self) -> Result<RotationConfig, ConfigError> {
        RotationConfig::new(self.max_size, self.max_files)
            .map_err(|e| ConfigError::validation("logger.file.rotation", e.to_string()))
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
///
/// This structure represents the entire configuration that can be loaded
/// from TOML files and environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// API server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// CORS proxy configuration
    #[serde(default)]
    pub proxy: ProxySettings,

    /// Live platform configuration
    #[serde(default)]
    pub platforms: PlatformsConfig,

    /// Persistent store configuration
    #[serde(default)]
    pub store: StoreSettings,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,
}
