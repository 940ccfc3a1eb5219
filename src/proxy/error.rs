use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure of the local CORS proxy, either in its lifecycle or while
/// resending a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("proxy is not running")]
    NotRunning,

    #[error("proxy is already running")]
    AlreadyRunning,

    /// Empty origin handed to `get_proxy_url`
    #[error("invalid origin")]
    InvalidOrigin,

    /// Resend request without an `origin` query parameter
    #[error("origin is required")]
    MissingOrigin,

    #[error("origin is not an absolute http(s) url")]
    MalformedOrigin,

    #[error("failed to read request body")]
    RequestBody,

    #[error("no available port at or above {start}")]
    NoAvailablePort { start: u16 },

    #[error("failed to bind proxy listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to build proxy client: {0}")]
    Client(#[source] reqwest::Error),

    /// Origin unreachable, timed out or reset mid-request. The display form
    /// deliberately omits the origin URL.
    #[error("failed to reach origin")]
    Upstream(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingOrigin | ProxyError::InvalidOrigin | ProxyError::RequestBody => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::MalformedOrigin => StatusCode::UNPROCESSABLE_ENTITY,
            ProxyError::AlreadyRunning => StatusCode::CONFLICT,
            ProxyError::NotRunning => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::NoAvailablePort { .. }
            | ProxyError::Bind(_)
            | ProxyError::Client(_)
            | ProxyError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Resend failures answer with `{"error": "<message>"}`.
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() }).to_string();
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_body_is_json_with_charset() {
        let response = ProxyError::MissingOrigin.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json; charset=utf-8"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "origin is required");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ProxyError::MalformedOrigin.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ProxyError::NoAvailablePort { start: 11451 }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
