//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use crate::proxy::ProxyConfig;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap since every service holds `Arc`s internally.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Tunables for the `/cors` route mounted on the API server
    pub proxy_config: ProxyConfig,
}

impl AppState {
    pub fn new(services: Services, proxy_config: ProxyConfig) -> Self {
        Self {
            services,
            proxy_config,
        }
    }
}
