//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use axum::http::HeaderValue;
use url::Url;

use crate::config::error::ConfigError;
use crate::config::settings::{
    BilibiliSettings, FileSettings, LoggerSettings, ProxySettings, ServerConfig, Settings,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Host must not be empty
    /// - Port must be between 1 and 65535
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::validation(
                "server.host",
                "Host is required. Use 127.0.0.1 to listen on loopback only.",
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        Ok(())
    }
}

impl ProxySettings {
    /// Validate proxy configuration
    ///
    /// # Validation Rules
    /// - Resend timeout and shutdown grace period must be greater than 0
    /// - User-Agent must be a non-empty, valid header value
    /// - Max body size must be greater than 0
    ///
    /// A default port of 0 is allowed and means "any free port".
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resend_timeout == 0 {
            return Err(ConfigError::validation(
                "proxy.resend_timeout",
                "Resend timeout must be greater than 0 seconds.",
            ));
        }

        if self.shutdown_grace_period == 0 {
            return Err(ConfigError::validation(
                "proxy.shutdown_grace_period",
                "Shutdown grace period must be greater than 0 seconds.",
            ));
        }

        if self.user_agent.trim().is_empty() || HeaderValue::from_str(&self.user_agent).is_err() {
            return Err(ConfigError::validation(
                "proxy.user_agent",
                "User-Agent must be a non-empty, printable ASCII string.",
            ));
        }

        if self.max_body_size == 0 {
            return Err(ConfigError::validation(
                "proxy.max_body_size",
                "Max body size must be greater than 0 bytes.",
            ));
        }

        Ok(())
    }
}

impl BilibiliSettings {
    /// The API base must be an absolute http(s) URL, checked even when the
    /// platform is disabled so a later toggle cannot surface a bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = Url::parse(&self.api_base)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);
        if !valid {
            return Err(ConfigError::validation(
                "platforms.bilibili.api_base",
                format!(
                    "Invalid API base '{}'. Expected an absolute http(s) URL.",
                    self.api_base
                ),
            ));
        }
        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        self.parse_format()?;

        if self.rotation.max_size == 0 {
            return Err(ConfigError::validation(
                "logger.file.rotation.max_size",
                "Max file size must be greater than 0 bytes.",
            ));
        }

        if self.rotation.max_files == 0 {
            return Err(ConfigError::validation(
                "logger.file.rotation.max_files",
                "At least one rotated file must be kept.",
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.proxy.validate()?;
        self.platforms.bilibili.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}
