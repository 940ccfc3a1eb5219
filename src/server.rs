//! Server module for managing HTTP server lifecycle
//!
//! This module handles service initialization, proxy and API startup, and
//! graceful shutdown.

use std::future::Future;

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::{Environment, settings::Settings};
use crate::error::{AppError, AppResult};
use crate::services::Services;
use crate::state::AppState;

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    /// Create a new server with the given settings
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn log_configuration(&self) {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env(),
            "Application starting"
        );

        tracing::info!(
            host = %self.settings.server.host,
            port = self.settings.server.port,
            "Server configuration loaded"
        );

        let proxy = &self.settings.proxy;
        tracing::info!(
            default_port = proxy.default_port,
            resend_timeout = proxy.resend_timeout,
            rewrite_assets = proxy.rewrite_assets,
            rewrite_live_urls = proxy.rewrite_live_urls,
            "Proxy configuration loaded"
        );

        let bilibili = &self.settings.platforms.bilibili;
        tracing::info!(
            enabled = bilibili.enabled,
            api_base = %bilibili.api_base,
            "Bilibili configuration loaded"
        );

        tracing::info!(
            level = %self.settings.logger.level,
            console_enabled = self.settings.logger.console.enabled,
            file_enabled = self.settings.logger.file.enabled,
            "Logger configuration loaded"
        );
    }

    /// Start the proxy and the API server and run until shutdown signal
    ///
    /// This method:
    /// 1. Logs startup information
    /// 2. Opens the stores and builds the services
    /// 3. Starts the standalone proxy
    /// 4. Binds to the configured address and serves the API
    /// 5. Stops the proxy once the API server has drained
    ///
    /// # Errors
    /// - Store or platform initialization errors
    /// - Proxy startup errors
    /// - Address binding errors
    /// - Server runtime errors
    pub async fn run(self) -> AppResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Same as [`Server::run`] but stops when `shutdown` completes.
    pub async fn run_until<F>(self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.log_configuration();

        let services = Services::from_settings(&self.settings).await?;
        tracing::info!("Services created");

        let proxy = services.proxy().clone();
        let proxy_port = proxy.start().await?;
        tracing::info!(port = proxy_port, "Proxy started");

        let state = AppState::new(services, self.settings.proxy.to_proxy_config());
        let router = create_router(state)?;
        tracing::info!("Router configured");

        let address = self.settings.server.address();
        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, address = %address, "Failed to bind to address");
                stop_proxy(&proxy).await;
                return Err(AppError::Internal {
                    source: anyhow::anyhow!("Failed to bind to {address}: {e}"),
                });
            }
        };

        tracing::info!(address = %address, "Server listening");

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        stop_proxy(&proxy).await;
        served.map_err(|e| AppError::Internal { source: e.into() })?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

async fn stop_proxy(proxy: &crate::proxy::ProxyServer) {
    match proxy.stop().await {
        Ok(()) => tracing::info!("Proxy stopped"),
        Err(e) => tracing::warn!(error = %e, "Failed to stop proxy"),
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
///
/// If a handler cannot be installed, that signal source is ignored and the
/// other one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
