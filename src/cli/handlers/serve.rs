//! Serve command handler
//!
//! Handles the serve command including dry-run validation and server startup.

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::server::Server;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    /// Create a new serve command handler
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the serve command with optional dry-run support
    ///
    /// # Arguments
    /// * `dry_run` - If true, validates configuration and exits without starting anything
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Store, proxy or listener startup errors (if not dry-run)
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }
        Server::new(self.config.clone()).run().await
    }

    /// Validate configuration without starting the server
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        let store_dir = self.config.store.resolve_dir()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!(
            "✓ Proxy would listen on the first free port at or above {}",
            self.config.proxy.default_port
        );
        println!("✓ Stores would be kept in: {}", store_dir.display());
        println!(
            "✓ Bilibili platform: {}",
            if self.config.platforms.bilibili.enabled {
                self.config.platforms.bilibili.api_base.as_str()
            } else {
                "disabled"
            }
        );

        println!("Dry run completed successfully");
        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &Settings {
        &self.config
    }
}
