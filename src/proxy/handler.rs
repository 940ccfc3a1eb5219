//! Resend core shared by the standalone proxy and the `/cors` mount.

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::{RawQuery, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, header},
    response::Response,
    routing::any,
};
use tracing::{debug, info, warn};
use url::Url;

use super::{ProxyConfig, ProxyError};
use crate::external::user_agent::PROXY_USER_AGENT;

/// Query parameter carrying the percent-encoded origin URL.
pub const ORIGIN_QUERY_KEY: &str = "origin";

/// Path of the mounted resend route on the API server.
pub const CORS_PATH: &str = "/cors";

/// Inbound headers forwarded to the origin. `User-Agent` is always replaced.
const FORWARDED_REQUEST_HEADERS: [HeaderName; 7] = [
    header::CONTENT_TYPE,
    header::ACCEPT,
    header::ACCEPT_LANGUAGE,
    header::ACCEPT_ENCODING,
    header::CACHE_CONTROL,
    header::IF_NONE_MATCH,
    header::IF_MODIFIED_SINCE,
];

/// Origin headers the standalone proxy hands back to the caller.
const STANDALONE_RESPONSE_HEADERS: [HeaderName; 6] = [
    header::CONTENT_TYPE,
    header::CONTENT_ENCODING,
    header::CACHE_CONTROL,
    header::ETAG,
    header::LAST_MODIFIED,
    header::EXPIRES,
];

const CORS_HEADER_PREFIX: &str = "access-control-";

/// Which origin response headers survive the resend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Cache and content metadata only; `access-control-*` never passes.
    Standalone,
    /// Only `access-control-*` headers.
    CorsOnly,
}

impl HeaderPolicy {
    pub fn allows(self, name: &HeaderName) -> bool {
        // header names are stored lowercase
        match self {
            HeaderPolicy::Standalone => STANDALONE_RESPONSE_HEADERS.contains(name),
            HeaderPolicy::CorsOnly => name.as_str().starts_with(CORS_HEADER_PREFIX),
        }
    }
}

/// Replays an inbound request against the origin named in its query string.
#[derive(Clone)]
pub struct Resender {
    client: reqwest::Client,
    timeout: Duration,
    user_agent: HeaderValue,
    max_body_size: usize,
    policy: HeaderPolicy,
}

impl Resender {
    pub fn new(config: &ProxyConfig, policy: HeaderPolicy) -> Result<Self, ProxyError> {
        // Bodies are streamed back untouched, so the client must not decode
        // them behind the caller's Accept-Encoding.
        let client = reqwest::Client::builder()
            .no_proxy()
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .no_zstd()
            .build()
            .map_err(ProxyError::Client)?;

        let user_agent = HeaderValue::from_str(&config.user_agent).unwrap_or_else(|_| {
            warn!(
                user_agent = %config.user_agent,
                "Configured proxy user agent is not a valid header value, using default"
            );
            HeaderValue::from_static(PROXY_USER_AGENT)
        });

        Ok(Self {
            client,
            timeout: config.resend_timeout,
            user_agent,
            max_body_size: config.max_body_size,
            policy,
        })
    }

    /// Router answering every path and method with a resend.
    pub fn into_fallback_router<S>(self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new().fallback(resend).with_state(self)
    }

    async fn resend(
        &self,
        method: Method,
        query: Option<&str>,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<Response, ProxyError> {
        let origin = origin_from_query(query).ok_or_else(|| {
            warn!("Origin query is empty");
            ProxyError::MissingOrigin
        })?;
        let origin = parse_origin(&origin).inspect_err(|_| {
            warn!(origin = %origin, "Cannot parse origin url");
        })?;

        let body = axum::body::to_bytes(body, self.max_body_size)
            .await
            .map_err(|e| {
                warn!(error = %e, "Cannot read inbound request body");
                ProxyError::RequestBody
            })?;

        let mut outbound = HeaderMap::new();
        outbound.insert(header::USER_AGENT, self.user_agent.clone());
        for name in &FORWARDED_REQUEST_HEADERS {
            if let Some(value) = headers.get(name) {
                outbound.insert(name.clone(), value.clone());
            }
        }

        info!(method = %method, origin = %origin, "Resending request");

        // reqwest's per-request timeout also covers reading the streamed body
        let upstream = self
            .client
            .request(method, origin.clone())
            .headers(outbound)
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(origin = %origin, error = %e, "Cannot resend the request");
                ProxyError::Upstream(e)
            })?;

        let status = upstream.status();
        let mut passed = HeaderMap::new();
        for (name, value) in upstream.headers() {
            if self.policy.allows(name) {
                passed.append(name.clone(), value.clone());
            }
        }
        debug!(
            origin = %origin,
            status = status.as_u16(),
            headers = passed.len(),
            "Origin responded"
        );

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = passed;
        Ok(response)
    }
}

async fn resend(
    State(resender): State<Resender>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ProxyError> {
    resender
        .resend(method, query.as_deref(), &headers, body)
        .await
}

/// The resend core mounted at `/cors`, passing through only CORS headers.
pub fn cors_routes<S>(config: &ProxyConfig) -> Result<Router<S>, ProxyError>
where
    S: Clone + Send + Sync + 'static,
{
    let resender = Resender::new(config, HeaderPolicy::CorsOnly)?;
    Ok(Router::new()
        .route(CORS_PATH, any(resend))
        .with_state(resender))
}

fn origin_from_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == ORIGIN_QUERY_KEY)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn parse_origin(origin: &str) -> Result<Url, ProxyError> {
    let url = Url::parse(origin).map_err(|_| ProxyError::MalformedOrigin)?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(ProxyError::MalformedOrigin),
    }
}
