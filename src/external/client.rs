use std::sync::LazyLock;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{IntoUrl, Request, RequestBuilder, Response};

use super::error::PlatformError;
use super::user_agent::random_user_agent;

/// Global HTTP client instance with optimized configuration
///
/// This client is initialized lazily on first access and reused across the application.
///
/// # Features
/// - **Random Chrome User-Agent**: picked once on initialization
/// - **Compression**: Supports gzip, deflate, brotli, and zstd compression
/// - **HTTP/2**: Full HTTP/2 support with adaptive window sizing and keep-alive
/// - **Timeouts**: 30s request timeout, 10s connect timeout
/// - **Security**: Uses Rustls for TLS (no OpenSSL dependency)
///
/// No cookie store is attached: session cookies are injected per request by
/// [`JsonClient`](super::json::JsonClient) so the client stays stateless.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        // Timeouts
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        // HTTP/2 settings
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Duration::from_secs(10))
        .http2_keep_alive_timeout(Duration::from_secs(20))
        // Enable compression (gzip, deflate, brotli, zstd)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        // Security
        .https_only(false)
        .use_rustls_tls()
        .user_agent(random_user_agent())
        .build()
        .expect("Failed to build HTTP client")
});

/// Thin wrapper that adds per-platform default headers and status checking.
///
/// Every header in `default_headers` is added to a request only when the
/// caller did not set it already. Transport failures and any status of 400 or
/// above come back as [`PlatformError`]; nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    default_headers: HeaderMap,
}

impl HttpClient {
    /// Client backed by the shared [`HTTP_CLIENT`].
    pub fn new(default_headers: HeaderMap) -> Self {
        Self::with_client(HTTP_CLIENT.clone(), default_headers)
    }

    pub fn with_client(inner: reqwest::Client, default_headers: HeaderMap) -> Self {
        Self {
            inner,
            default_headers,
        }
    }

    /// Starts a GET request on the underlying client.
    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.inner.get(url)
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub async fn execute(&self, mut request: Request) -> Result<Response, PlatformError> {
        let headers = request.headers_mut();
        for (name, value) in &self.default_headers {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }

        tracing::debug!(method = %request.method(), url = %request.url(), "Sending platform request");

        let response = self
            .inner
            .execute(request)
            .await
            .map_err(PlatformError::RequestFailed)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(PlatformError::HttpStatus { status });
        }
        Ok(response)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(HeaderMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_addr, direct_client, spawn_server};
    use axum::Router;
    use axum::http::{HeaderMap as AxumHeaderMap, StatusCode};
    use axum::routing::get;
    use reqwest::header::{HeaderValue, USER_AGENT};

    fn echo_router() -> Router {
        Router::new()
            .route(
                "/echo",
                get(|headers: AxumHeaderMap| async move {
                    let pick = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string()
                    };
                    format!("{}|{}", pick("x-platform"), pick("user-agent"))
                }),
            )
            .route("/bad", get(|| async { StatusCode::BAD_REQUEST }))
            .route("/boom", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
    }

    fn client_with_defaults() -> HttpClient {
        let mut headers = HeaderMap::new();
        headers.insert("x-platform", HeaderValue::from_static("default"));
        headers.insert(USER_AGENT, HeaderValue::from_static("default-agent"));
        HttpClient::with_client(direct_client(), headers)
    }

    #[test]
    fn test_client_initialization() {
        let _ = &*HTTP_CLIENT;
    }

    #[tokio::test]
    async fn test_default_headers_are_injected() {
        let addr = spawn_server(echo_router()).await;
        let client = client_with_defaults();
        let request = client
            .get(format!("http://{}/echo", addr))
            .build()
            .unwrap();

        let body = client.execute(request).await.unwrap().text().await.unwrap();
        assert_eq!(body, "default|default-agent");
    }

    #[tokio::test]
    async fn test_caller_headers_win_over_defaults() {
        let addr = spawn_server(echo_router()).await;
        let client = client_with_defaults();
        let request = client
            .get(format!("http://{}/echo", addr))
            .header("x-platform", "caller")
            .build()
            .unwrap();

        let body = client.execute(request).await.unwrap().text().await.unwrap();
        assert_eq!(body, "caller|default-agent");
    }

    #[tokio::test]
    async fn test_client_error_status_fails() {
        let addr = spawn_server(echo_router()).await;
        let client = client_with_defaults();
        let request = client.get(format!("http://{}/bad", addr)).build().unwrap();

        let err = client.execute(request).await.unwrap_err();
        assert!(matches!(
            err,
            PlatformError::HttpStatus {
                status: StatusCode::BAD_REQUEST
            }
        ));
        assert!(err.to_string().contains("status code: 400"));
    }

    #[tokio::test]
    async fn test_server_error_status_fails() {
        let addr = spawn_server(echo_router()).await;
        let client = client_with_defaults();
        let request = client.get(format!("http://{}/boom", addr)).build().unwrap();

        let err = client.execute(request).await.unwrap_err();
        assert!(err.to_string().contains("status code: 500"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_request_failed() {
        let addr = closed_addr().await;
        let client = client_with_defaults();
        let request = client.get(format!("http://{}/echo", addr)).build().unwrap();

        let err = client.execute(request).await.unwrap_err();
        assert!(matches!(err, PlatformError::RequestFailed(_)));
    }
}
