//! Service layer for business logic operations.
//!
//! Services sit between the HTTP handlers (or the CLI) and the platform
//! resolvers, the local proxy and the JSON stores.

mod board_service;
mod platform_service;
mod setting_service;
pub mod views;

pub use board_service::{BOARD_STORE_NAME, BoardService};
pub use platform_service::{PlatformService, RewriteOptions};
pub use setting_service::{SETTING_STORE_NAME, SettingService};

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::external::json::CookieProvider;
use crate::external::live::{BilibiliLive, LivePlatformProvider};
use crate::proxy::ProxyServer;
use crate::store::JsonStore;
use views::BoardView;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since every service only holds `Arc`s.
#[derive(Clone)]
pub struct Services {
    pub platforms: PlatformService,
    pub boards: BoardService,
    pub settings: SettingService,
}

impl Services {
    pub fn new(platforms: PlatformService, boards: BoardService, settings: SettingService) -> Self {
        Self {
            platforms,
            boards,
            settings,
        }
    }

    /// Opens the stores and wires every service from configuration.
    ///
    /// The proxy is created stopped; the caller decides when to start it.
    pub async fn from_settings(settings: &Settings) -> AppResult<Self> {
        let store_dir = settings.store.resolve_dir()?;
        tracing::info!(dir = %store_dir.display(), "Opening stores");

        let board_store =
            JsonStore::<Vec<BoardView>>::open(&store_dir, BOARD_STORE_NAME, &Vec::new()).await?;
        let setting_store = JsonStore::<HashMap<String, String>>::open(
            &store_dir,
            SETTING_STORE_NAME,
            &HashMap::new(),
        )
        .await?;

        let proxy = Arc::new(ProxyServer::new(settings.proxy.to_proxy_config()));
        let setting_service = SettingService::new(Arc::new(setting_store));

        let mut providers: Vec<Arc<dyn LivePlatformProvider>> = Vec::new();
        let bilibili = &settings.platforms.bilibili;
        if bilibili.enabled {
            let cookies: Arc<dyn CookieProvider> = Arc::new(setting_service.clone());
            let resolver = BilibiliLive::connect(&bilibili.api_base, Some(cookies)).map_err(
                |e| AppError::Configuration {
                    key: "platforms.bilibili.api_base".to_string(),
                    source: e.into(),
                },
            )?;
            providers.push(Arc::new(resolver));
        } else {
            tracing::info!("Bilibili platform disabled");
        }

        Ok(Self::new(
            PlatformService::new(providers, proxy.clone(), settings.proxy.rewrite_options()),
            BoardService::new(Arc::new(board_store), proxy),
            setting_service,
        ))
    }

    pub fn proxy(&self) -> &Arc<ProxyServer> {
        self.platforms.proxy()
    }
}
