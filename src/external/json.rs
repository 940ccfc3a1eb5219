//! Typed client for `{code, message, data}` JSON envelope APIs.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Request;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::client::HttpClient;
use super::error::PlatformError;

/// Source of a session cookie attached to every envelope request.
#[async_trait]
pub trait CookieProvider: Send + Sync {
    /// Current cookie, `None` or empty when the user has not configured one.
    async fn cookie(&self) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// JSON client that unwraps envelope responses into `T`.
///
/// Holds no mutable state, so one instance can be shared across concurrent
/// calls.
#[derive(Clone)]
pub struct JsonClient {
    http: HttpClient,
    cookies: Option<Arc<dyn CookieProvider>>,
}

impl JsonClient {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            cookies: None,
        }
    }

    pub fn with_cookie_provider(mut self, provider: Arc<dyn CookieProvider>) -> Self {
        self.cookies = Some(provider);
        self
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Sends `request` and decodes the envelope's `data` into `T`.
    ///
    /// The envelope header is checked before `data` is decoded, so a
    /// non-zero `code` is reported as [`PlatformError::Api`] even when the
    /// platform sends `null` or an unrelated shape as `data`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        mut request: Request,
    ) -> Result<T, PlatformError> {
        self.attach_cookie(&mut request).await;

        let response = self.http.execute(request).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("application/json") {
            return Err(PlatformError::UnexpectedContentType(content_type));
        }

        let body = response
            .bytes()
            .await
            .map_err(PlatformError::RequestFailed)?;
        let envelope: Envelope =
            serde_json::from_slice(&body).map_err(PlatformError::MalformedEnvelope)?;

        if envelope.code != 0 {
            return Err(PlatformError::Api {
                code: envelope.code,
                message: envelope.message,
            });
        }

        serde_json::from_value(envelope.data).map_err(PlatformError::MalformedEnvelope)
    }

    async fn attach_cookie(&self, request: &mut Request) {
        let Some(provider) = &self.cookies else {
            return;
        };
        let Some(cookie) = provider.cookie().await.filter(|c| !c.is_empty()) else {
            return;
        };
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                tracing::debug!(host = ?request.url().host_str(), "Using configured session cookie");
                request.headers_mut().insert(COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring session cookie with invalid characters"),
        }
    }
}
