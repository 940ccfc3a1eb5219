//! Error handler for converting AppError to HTTP responses.
//!
//! `AppError` renders itself as an `ErrorResponse`; `global_error_handler`
//! normalizes every other error response (plain-text rejections, unmatched
//! routes) into the same shape and stamps the request ID on it.

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Larger error bodies are replaced with a generic one.
const MAX_ERROR_BODY: usize = 64 * 1024;

impl IntoResponse for AppError {
    /// # Status Code Mapping
    /// - NotFound → 404
    /// - Validation, ValidationErrors, BadRequest → 400
    /// - Proxy → the proxy error's own status
    /// - Store, Configuration, Internal → 500
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        let code = error_to_code(&self);

        let body = match &self {
            AppError::NotFound { .. }
            | AppError::Validation { .. }
            | AppError::BadRequest { .. }
            | AppError::Proxy(_) => ErrorResponse::new(code, self.to_string()),
            AppError::ValidationErrors { errors } => {
                let details = errors
                    .iter()
                    .map(|e| json!({"field": e.field, "message": e.message}))
                    .collect::<Vec<_>>();
                ErrorResponse::new(code, self.to_string()).with_details(json!(details))
            }
            AppError::Configuration { key, .. } => {
                tracing::error!(error = ?self, "Configuration error while serving request");
                ErrorResponse::new(code, format!("Configuration error: {key}"))
                    .with_details(json!({"key": key}))
            }
            AppError::Store(_) | AppError::Internal { .. } => {
                // internals stay in the log
                tracing::error!(error = ?self, "Request failed");
                ErrorResponse::new(code, "An internal error occurred")
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Proxy(e) => e.status_code(),
        AppError::Store(_) | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Maps an AppError variant to its error code string.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::Proxy(_) => "PROXY_ERROR",
        AppError::Store(_) => "STORE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

fn default_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_CONTENT",
        s if s.is_server_error() => "INTERNAL_ERROR",
        _ => "UNKNOWN_ERROR",
    }
}

fn default_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "The requested resource was not found",
        StatusCode::METHOD_NOT_ALLOWED => "HTTP method not allowed for this endpoint",
        _ => status.canonical_reason().unwrap_or("Request failed"),
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Normalizes error responses into `ErrorResponse` and adds the request ID.
///
/// Successful responses pass through without being buffered.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().cloned();
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let was_json = is_json(&response);
    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, MAX_ERROR_BODY).await else {
        // unreadable or oversized; the status alone has to do
        return (status, Json(ErrorResponse::new(default_code(status), default_message(status))))
            .into_response();
    };

    let parsed = if was_json {
        serde_json::from_slice::<ErrorResponse>(&bytes).ok()
    } else {
        None
    };
    let mut error = parsed.unwrap_or_else(|| {
        let text = String::from_utf8_lossy(&bytes).trim().to_string();
        let message = if text.is_empty() || was_json {
            default_message(status).to_string()
        } else {
            text
        };
        ErrorResponse::new(default_code(status), message)
    });

    if let Some(RequestId(id)) = request_id
        && error.request_id.is_none()
    {
        error = error.with_request_id(&id);
    }

    let Ok(body) = serde_json::to_vec(&error) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::request_id_middleware;
    use crate::proxy::ProxyError;
    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_code_mapping() {
        let cases = [
            (
                AppError::not_found("Room", "id", "1"),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::BadRequest {
                    message: "x".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::ValidationErrors { errors: vec![] },
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Proxy(ProxyError::NotRunning),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Proxy(ProxyError::AlreadyRunning),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Internal {
                    source: anyhow::anyhow!("boom"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error_to_status_code(&error), status, "{error}");
        }
    }

    #[tokio::test]
    async fn test_not_found_response_body() {
        let response = AppError::not_found("Room", "id", "42").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Resource not found: Room with id=42");
    }

    #[tokio::test]
    async fn test_internal_error_is_sanitized() {
        let response = AppError::Internal {
            source: anyhow::anyhow!("secret path /home/user/.config"),
        }
        .into_response();
        let json = body_json(response).await;
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert!(!json.to_string().contains("/home/user"));
    }

    #[tokio::test]
    async fn test_validation_errors_have_details() {
        let response = AppError::ValidationErrors {
            errors: vec![crate::error::ValidationFieldError {
                field: "name".to_string(),
                message: "name must be 1-100 characters".to_string(),
            }],
        }
        .into_response();
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"][0]["field"], "name");
    }

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route("/plain", get(|| async { (StatusCode::BAD_REQUEST, "bad thing") }))
            .route(
                "/typed",
                get(|| async { AppError::not_found("Board", "id", "b1") }),
            )
            .fallback(|| async { StatusCode::NOT_FOUND })
            .layer(middleware::from_fn(global_error_handler))
            .layer(middleware::from_fn(request_id_middleware))
    }

    fn get_request(uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header("x-request-id", "req-7")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let response = app().oneshot(get_request("/ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"fine");
    }

    #[tokio::test]
    async fn test_plain_text_error_is_wrapped() {
        let response = app().oneshot(get_request("/plain")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "BAD_REQUEST");
        assert_eq!(json["message"], "bad thing");
        assert_eq!(json["request_id"], "req-7");
    }

    #[tokio::test]
    async fn test_typed_error_gets_request_id() {
        let response = app().oneshot(get_request("/typed")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["request_id"], "req-7");
    }

    #[tokio::test]
    async fn test_unmatched_route_is_wrapped() {
        let response = app().oneshot(get_request("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "The requested resource was not found");
    }
}
