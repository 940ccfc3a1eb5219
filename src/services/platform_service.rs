//! Resolution facade over the registered platform resolvers.
//!
//! Every resolver failure ends here: it is logged and turned into `None`.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use super::views::{OwnerView, PlatformView, QualityView, RoomView};
use crate::external::live::LivePlatformProvider;
use crate::proxy::{ProxyError, ProxyServer};

/// Which outward URLs are routed through the local proxy.
#[derive(Debug, Clone, Copy)]
pub struct RewriteOptions {
    /// Cover and avatar images.
    pub assets: bool,
    /// Stream URLs returned by `get_live_urls`.
    pub live_urls: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            assets: true,
            live_urls: false,
        }
    }
}

#[derive(Clone)]
pub struct PlatformService {
    registry: Arc<BTreeMap<String, Arc<dyn LivePlatformProvider>>>,
    proxy: Arc<ProxyServer>,
    rewrite: RewriteOptions,
}

impl PlatformService {
    pub fn new(
        providers: Vec<Arc<dyn LivePlatformProvider>>,
        proxy: Arc<ProxyServer>,
        rewrite: RewriteOptions,
    ) -> Self {
        let registry = providers
            .into_iter()
            .map(|p| (p.id().to_string(), p))
            .collect();
        Self {
            registry: Arc::new(registry),
            proxy,
            rewrite,
        }
    }

    pub fn proxy(&self) -> &Arc<ProxyServer> {
        &self.proxy
    }

    fn provider(&self, platform_id: &str) -> Option<&Arc<dyn LivePlatformProvider>> {
        let provider = self.registry.get(platform_id);
        if provider.is_none() {
            warn!(platform_id, "Cannot find platform");
        }
        provider
    }

    fn proxied(&self, origin: &Url) -> Result<String, ProxyError> {
        self.proxy
            .get_proxy_url(origin.as_str())
            .map(String::from)
    }

    fn asset_url(&self, origin: &Url) -> Result<String, ProxyError> {
        if self.rewrite.assets {
            self.proxied(origin)
        } else {
            Ok(origin.to_string())
        }
    }

    /// Registered platforms ordered by id.
    pub fn list_platforms(&self) -> Vec<PlatformView> {
        let platforms: Vec<_> = self
            .registry
            .values()
            .map(|p| PlatformView::of(p.as_ref()))
            .collect();
        info!(count = platforms.len(), "Get platforms");
        platforms
    }

    pub fn get_platform(&self, platform_id: &str) -> Option<PlatformView> {
        let provider = self.provider(platform_id)?;
        info!(platform_id, "Get platform");
        Some(PlatformView::of(provider.as_ref()))
    }

    pub async fn get_room(&self, platform_id: &str, room_id: &str) -> Option<RoomView> {
        let provider = self.provider(platform_id)?;
        let room = provider
            .get_room(room_id)
            .await
            .inspect_err(|e| warn!(platform_id, room_id, error = %e, "Failed to get room"))
            .ok()?;

        let images = self.asset_url(&room.cover_url).and_then(|cover| {
            self.asset_url(&room.owner.avatar_url)
                .map(|avatar| (cover, avatar))
        });
        let (cover_url, avatar_url) = images
            .inspect_err(|e| warn!(platform_id, room_id, error = %e, "Failed to proxy room images"))
            .ok()?;

        info!(platform_id, room_id, canonical_id = %room.id, "Get room");
        Some(RoomView {
            id: room.id,
            title: room.title,
            owner: OwnerView {
                id: room.owner.id,
                name: room.owner.name,
                avatar_url,
            },
            is_online: room.is_online,
            cover_url,
            platform: PlatformView::of(provider.as_ref()),
        })
    }

    pub async fn get_qualities(&self, platform_id: &str, room_id: &str) -> Option<Vec<QualityView>> {
        let provider = self.provider(platform_id)?;
        let qualities = provider
            .get_qualities(room_id)
            .await
            .inspect_err(|e| warn!(platform_id, room_id, error = %e, "Failed to get qualities"))
            .ok()?;

        info!(platform_id, room_id, count = qualities.len(), "Get qualities");
        Some(qualities.into_iter().map(QualityView::from).collect())
    }

    pub async fn get_live_urls(
        &self,
        platform_id: &str,
        room_id: &str,
        quality_id: &str,
    ) -> Option<Vec<String>> {
        let provider = self.provider(platform_id)?;
        let urls = provider
            .get_live_urls(room_id, quality_id)
            .await
            .inspect_err(|e| {
                warn!(platform_id, room_id, quality_id, error = %e, "Failed to get live urls")
            })
            .ok()?;

        let urls = if self.rewrite.live_urls {
            urls.iter()
                .map(|u| self.proxied(u))
                .collect::<Result<Vec<_>, _>>()
                .inspect_err(|e| warn!(platform_id, room_id, error = %e, "Failed to proxy live urls"))
                .ok()?
        } else {
            urls.into_iter().map(String::from).collect()
        };

        info!(platform_id, room_id, quality_id, count = urls.len(), "Get live urls");
        Some(urls)
    }
}
