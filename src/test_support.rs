//! Helpers shared by the in-crate test modules.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use url::Url;

use crate::external::PlatformError;
use crate::external::live::{LivePlatformProvider, Owner, Quality, Room};
use crate::proxy::{ProxyConfig, ProxyServer};
use crate::services::views::BoardView;
use crate::services::{
    BOARD_STORE_NAME, BoardService, PlatformService, RewriteOptions, SETTING_STORE_NAME, Services,
    SettingService,
};
use crate::store::JsonStore;

/// Serves `router` on an ephemeral loopback port and returns its address.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}

/// reqwest client that ignores proxy environment variables.
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build test client")
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    drop(listener);
    addr
}

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Serializes tests that read or modify process environment variables.
pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

/// Resolver with one room, `1000`, also reachable through the alias `1`.
pub struct FakePlatform;

fn fake_url(raw: &str) -> Url {
    Url::parse(raw).expect("Invalid fixture url")
}

#[async_trait]
impl LivePlatformProvider for FakePlatform {
    fn id(&self) -> &str {
        "fake"
    }

    fn name(&self) -> &str {
        "Fake Live"
    }

    fn icon_url(&self) -> Url {
        fake_url("https://fake.example/icon.png")
    }

    async fn get_room(&self, room_id: &str) -> Result<Room, PlatformError> {
        if room_id != "1000" && room_id != "1" {
            return Err(PlatformError::Api {
                code: 19002000,
                message: "not found".to_string(),
            });
        }
        Ok(Room {
            id: "1000".to_string(),
            title: "hello".to_string(),
            is_online: true,
            cover_url: fake_url("https://img.fake.example/cover.jpg"),
            owner: Owner {
                id: "7".to_string(),
                name: "owner".to_string(),
                avatar_url: fake_url("https://img.fake.example/face.jpg"),
            },
        })
    }

    async fn get_qualities(&self, _room_id: &str) -> Result<Vec<Quality>, PlatformError> {
        Ok(Quality::ranked(vec![
            ("10000".to_string(), "原画".to_string()),
            ("400".to_string(), "蓝光".to_string()),
        ]))
    }

    async fn get_live_urls(
        &self,
        _room_id: &str,
        _quality_id: &str,
    ) -> Result<Vec<Url>, PlatformError> {
        Ok(vec![fake_url("https://cn-a.example/live.flv")])
    }
}

/// Services over [`FakePlatform`] with both stores under `dir` and a stopped
/// proxy built from `proxy_config`.
pub async fn fake_services(
    dir: &Path,
    proxy_config: ProxyConfig,
    rewrite: RewriteOptions,
) -> Services {
    let proxy = Arc::new(ProxyServer::new(proxy_config));
    let boards = JsonStore::<Vec<BoardView>>::open(dir, BOARD_STORE_NAME, &Vec::new())
        .await
        .expect("Failed to open board store");
    let settings =
        JsonStore::<HashMap<String, String>>::open(dir, SETTING_STORE_NAME, &HashMap::new())
            .await
            .expect("Failed to open setting store");

    Services::new(
        PlatformService::new(vec![Arc::new(FakePlatform)], proxy.clone(), rewrite),
        BoardService::new(Arc::new(boards), proxy),
        SettingService::new(Arc::new(settings)),
    )
}
