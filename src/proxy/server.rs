use std::{
    net::Ipv4Addr,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use axum::Router;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tracing::{debug, info, warn};
use url::Url;

use super::{
    ProxyError,
    handler::{HeaderPolicy, ORIGIN_QUERY_KEY, Resender},
};
use crate::external::user_agent::PROXY_USER_AGENT;

pub const DEFAULT_PROXY_PORT: u16 = 11451;

/// Tunables of a proxy instance.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// First port tried; a value of 0 lets the OS pick one.
    pub default_port: u16,
    pub resend_timeout: Duration,
    pub shutdown_grace_period: Duration,
    pub user_agent: String,
    pub max_body_size: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PROXY_PORT,
            resend_timeout: Duration::from_secs(5),
            shutdown_grace_period: Duration::from_secs(3),
            user_agent: PROXY_USER_AGENT.to_string(),
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

enum Phase {
    Stopped,
    Starting,
    Running(Running),
    Stopping,
}

struct Running {
    port: u16,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Loopback reverse proxy that lets a browser fetch resources from hosts
/// that do not send CORS headers.
///
/// Every instance owns its own phase and port; two instances never share
/// state.
pub struct ProxyServer {
    config: ProxyConfig,
    phase: RwLock<Phase>,
}

impl ProxyServer {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config,
            phase: RwLock::new(Phase::Stopped),
        }
    }

    fn read_phase(&self) -> RwLockReadGuard<'_, Phase> {
        self.phase.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_phase(&self) -> RwLockWriteGuard<'_, Phase> {
        self.phase.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds the first free loopback port at or above the configured one and
    /// starts serving. Returns the bound port.
    pub async fn start(&self) -> Result<u16, ProxyError> {
        {
            let mut phase = self.write_phase();
            if !matches!(*phase, Phase::Stopped) {
                return Err(ProxyError::AlreadyRunning);
            }
            *phase = Phase::Starting;
        }

        match self.bind_and_spawn().await {
            Ok(running) => {
                let port = running.port;
                *self.write_phase() = Phase::Running(running);
                info!(port, "Proxy server started");
                Ok(port)
            }
            Err(e) => {
                *self.write_phase() = Phase::Stopped;
                Err(e)
            }
        }
    }

    async fn bind_and_spawn(&self) -> Result<Running, ProxyError> {
        let router: Router =
            Resender::new(&self.config, HeaderPolicy::Standalone)?.into_fallback_router();
        let listener = bind_from(self.config.default_port).await?;
        let port = listener.local_addr().map_err(ProxyError::Bind)?.port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let shutdown = async {
                shutdown_rx.await.ok();
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                warn!(port, error = %e, "Proxy server stopped with error");
            }
        });

        Ok(Running {
            port,
            shutdown_tx,
            handle,
        })
    }

    /// Signals the serve loop and waits up to the grace period for in-flight
    /// requests before aborting the accept loop.
    ///
    /// Connections already accepted may outlive the abort; each one is still
    /// bounded by the resend timeout.
    pub async fn stop(&self) -> Result<(), ProxyError> {
        let Running {
            port,
            shutdown_tx,
            mut handle,
        } = {
            let mut phase = self.write_phase();
            match std::mem::replace(&mut *phase, Phase::Stopping) {
                Phase::Running(running) => running,
                other => {
                    *phase = other;
                    return Err(ProxyError::NotRunning);
                }
            }
        };

        info!(port, "Stopping proxy server");
        shutdown_tx.send(()).ok();

        let grace = self.config.shutdown_grace_period;
        if tokio::time::timeout(grace, &mut handle).await.is_err() {
            warn!(
                port,
                grace_secs = grace.as_secs_f64(),
                "Proxy server did not drain in time, aborting"
            );
            handle.abort();
            handle.await.ok();
        }

        *self.write_phase() = Phase::Stopped;
        info!(port, "Proxy server stopped");
        Ok(())
    }

    pub fn port(&self) -> Option<u16> {
        match &*self.read_phase() {
            Phase::Running(running) => Some(running.port),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.port().is_some()
    }

    /// `http://127.0.0.1:<port>` while running.
    pub fn base_url(&self) -> Option<Url> {
        self.port().and_then(base_url_for)
    }

    /// Routes `origin` through this proxy.
    pub fn get_proxy_url(&self, origin: &str) -> Result<Url, ProxyError> {
        if origin.is_empty() {
            return Err(ProxyError::InvalidOrigin);
        }
        self.port()
            .and_then(|port| proxy_url_for(port, origin))
            .ok_or(ProxyError::NotRunning)
    }
}

impl Drop for ProxyServer {
    fn drop(&mut self) {
        let phase = self.phase.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Phase::Running(running) = std::mem::replace(phase, Phase::Stopped) {
            running.shutdown_tx.send(()).ok();
        }
    }
}

fn base_url_for(port: u16) -> Option<Url> {
    Url::parse(&format!("http://{}:{port}", Ipv4Addr::LOCALHOST)).ok()
}

fn proxy_url_for(port: u16, origin: &str) -> Option<Url> {
    let mut url = base_url_for(port)?;
    url.query_pairs_mut().append_pair(ORIGIN_QUERY_KEY, origin);
    Some(url)
}

async fn bind_from(start: u16) -> Result<TcpListener, ProxyError> {
    for port in start..=u16::MAX {
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => debug!(port, error = %e, "Port unavailable, trying next"),
        }
    }
    Err(ProxyError::NoAvailablePort { start })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{direct_client, spawn_server};
    use axum::{http::StatusCode, routing::get};
    use proptest::prelude::*;

    fn ephemeral() -> ProxyConfig {
        ProxyConfig {
            default_port: 0,
            ..ProxyConfig::default()
        }
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let proxy = ProxyServer::new(ephemeral());
        assert!(!proxy.is_running());
        assert!(proxy.base_url().is_none());

        let port = proxy.start().await.unwrap();
        assert_ne!(port, 0);
        assert_eq!(proxy.port(), Some(port));
        assert_eq!(
            proxy.base_url().map(|u| u.to_string()),
            Some(format!("http://127.0.0.1:{port}/"))
        );

        proxy.stop().await.unwrap();
        assert!(!proxy.is_running());
        assert_eq!(proxy.port(), None);
    }

    #[tokio::test]
    async fn test_double_start_keeps_port() {
        let proxy = ProxyServer::new(ephemeral());
        let port = proxy.start().await.unwrap();
        assert!(matches!(
            proxy.start().await,
            Err(ProxyError::AlreadyRunning)
        ));
        assert_eq!(proxy.port(), Some(port));
        proxy.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_double_stop_fails() {
        let proxy = ProxyServer::new(ephemeral());
        assert!(matches!(proxy.stop().await, Err(ProxyError::NotRunning)));
        proxy.start().await.unwrap();
        proxy.stop().await.unwrap();
        assert!(matches!(proxy.stop().await, Err(ProxyError::NotRunning)));
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let proxy = ProxyServer::new(ephemeral());
        proxy.start().await.unwrap();
        proxy.stop().await.unwrap();
        let port = proxy.start().await.unwrap();
        assert_eq!(proxy.port(), Some(port));
        proxy.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_occupied_port_is_skipped() {
        let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let taken_port = taken.local_addr().unwrap().port();
        if taken_port == u16::MAX {
            return;
        }
        let proxy = ProxyServer::new(ProxyConfig {
            default_port: taken_port,
            ..ProxyConfig::default()
        });
        let port = proxy.start().await.unwrap();
        assert!(port > taken_port);
        proxy.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_listener_closed_after_stop() {
        let proxy = ProxyServer::new(ephemeral());
        let port = proxy.start().await.unwrap();
        proxy.stop().await.unwrap();
        let result = direct_client()
            .get(format!("http://127.0.0.1:{port}/"))
            .send()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stop_after_grace_closes_listener_and_bounds_in_flight() {
        let origin = spawn_server(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;
        let proxy = ProxyServer::new(ProxyConfig {
            resend_timeout: Duration::from_millis(800),
            shutdown_grace_period: Duration::from_millis(200),
            ..ephemeral()
        });
        let port = proxy.start().await.unwrap();

        let url = proxy
            .get_proxy_url(&format!("http://{origin}/slow"))
            .unwrap();
        let in_flight = tokio::spawn(async move { direct_client().get(url).send().await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        tokio::time::timeout(Duration::from_secs(2), proxy.stop())
            .await
            .unwrap()
            .unwrap();
        assert!(
            direct_client()
                .get(format!("http://127.0.0.1:{port}/"))
                .send()
                .await
                .is_err()
        );

        let resp = tokio::time::timeout(Duration::from_secs(3), in_flight)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_get_proxy_url_requires_running_and_origin() {
        let proxy = ProxyServer::new(ephemeral());
        assert!(matches!(
            proxy.get_proxy_url("https://example.com/a.jpg"),
            Err(ProxyError::NotRunning)
        ));
        proxy.start().await.unwrap();
        assert!(matches!(
            proxy.get_proxy_url(""),
            Err(ProxyError::InvalidOrigin)
        ));
        proxy.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_proxy_url_fetches_origin() {
        let origin = spawn_server(Router::new().route("/cover.jpg", get(|| async { "jpeg" }))).await;
        let proxy = ProxyServer::new(ephemeral());
        proxy.start().await.unwrap();

        let url = proxy
            .get_proxy_url(&format!("http://{origin}/cover.jpg"))
            .unwrap();
        let resp = direct_client().get(url).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.unwrap(), "jpeg");

        proxy.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let a = ProxyServer::new(ephemeral());
        let b = ProxyServer::new(ephemeral());
        a.start().await.unwrap();
        assert!(!b.is_running());
        a.stop().await.unwrap();
    }

    proptest! {
        #[test]
        fn prop_proxy_url_round_trips_origin(
            path in "[a-z0-9/._-]{0,24}",
            query in "[a-zA-Z0-9=&%+ ]{0,24}",
            port in 1u16..,
        ) {
            let origin = format!("https://i0.hdslb.com/{path}?{query}");
            let url = proxy_url_for(port, &origin).unwrap();
            prop_assert_eq!(url.path(), "/");

            let decoded = url
                .query_pairs()
                .find(|(k, _)| k == ORIGIN_QUERY_KEY)
                .map(|(_, v)| v.into_owned());
            prop_assert_eq!(decoded, Some(origin));
            prop_assert_eq!(url.port_or_known_default(), Some(port));
        }
    }
}
