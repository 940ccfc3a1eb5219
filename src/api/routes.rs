//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use axum::{Router, http::StatusCode, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{global_error_handler, logging_middleware, request_id_middleware};
use crate::error::AppResult;
use crate::proxy::cors_routes;
use crate::state::AppState;

pub const SWAGGER_UI_PATH: &str = "/swagger-ui";
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Routes under `/api`, with CORS and compression applied.
fn api_routes() -> OpenApiRouter<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    OpenApiRouter::new()
        .merge(handlers::platforms::platform_routes())
        .merge(handlers::boards::board_routes())
        .merge(handlers::settings::setting_routes())
        .layer(CompressionLayer::new())
        .layer(cors)
}

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs first):
/// 1. Request ID middleware (runs first) - generates/propagates request IDs
/// 2. Logging middleware (runs second) - logs requests with request IDs
/// 3. Error normalization - everything except `/cors`, whose upstream
///    responses must reach the browser untouched
///
/// # Routes
/// - `/api/platforms`, `/api/boards`, `/api/settings`
/// - `/health`
/// - `/cors?origin=...`
/// - Swagger UI at `/swagger-ui`, OpenAPI document at `/api-docs/openapi.json`
pub fn create_router(state: AppState) -> AppResult<Router> {
    let cors_proxy = cors_routes(&state.proxy_config)?;

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", api_routes())
        .merge(handlers::health::health_routes())
        .split_for_parts();

    let router = router
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, openapi))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(middleware::from_fn(global_error_handler))
        .with_state(state)
        .merge(cors_proxy)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware));

    Ok(router)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::{Method, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::proxy::ProxyConfig;
    use crate::services::RewriteOptions;
    use crate::test_support::fake_services;

    async fn test_app(dir: &TempDir) -> Router {
        let proxy_config = ProxyConfig {
            default_port: 0,
            ..ProxyConfig::default()
        };
        let services = fake_services(
            dir.path(),
            proxy_config.clone(),
            RewriteOptions {
                assets: false,
                live_urls: false,
            },
        )
        .await;
        create_router(AppState::new(services, proxy_config)).unwrap()
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_platforms() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .oneshot(request(Method::GET, "/api/platforms", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!([{"id": "fake", "name": "Fake Live", "iconUrl": "https://fake.example/icon.png"}])
        );
    }

    #[tokio::test]
    async fn test_unknown_platform_is_not_found() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .oneshot(request(Method::GET, "/api/platforms/nope/rooms/1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
        let json = body_json(response).await;
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Resource not found: Platform with id=nope");
        assert!(json["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_room_by_alias() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/platforms/fake/rooms/1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["id"], "1000");
        assert_eq!(json["isOnline"], true);
        assert_eq!(json["coverUrl"], "https://img.fake.example/cover.jpg");
        assert_eq!(json["owner"]["avatarUrl"], "https://img.fake.example/face.jpg");
        assert_eq!(json["platform"]["id"], "fake");

        let response = app
            .oneshot(request(Method::GET, "/api/platforms/fake/rooms/2", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["message"],
            "Resource not found: Room with id=2"
        );
    }

    #[tokio::test]
    async fn test_qualities_and_urls() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .clone()
            .oneshot(request(
                Method::GET,
                "/api/platforms/fake/rooms/1000/qualities",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            json!([
                {"id": "10000", "name": "原画", "priority": 0},
                {"id": "400", "name": "蓝光", "priority": -1}
            ])
        );

        let response = app
            .oneshot(request(
                Method::GET,
                "/api/platforms/fake/rooms/1000/qualities/10000/urls",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            json!(["https://cn-a.example/live.flv"])
        );
    }

    #[tokio::test]
    async fn test_board_lifecycle() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;
        let board = json!({
            "id": "b1",
            "name": "evening",
            "rooms": [{"id": "1000", "platformId": "fake", "avatarUrl": ""}]
        });

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/boards", Some(board.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await, board);

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/boards", Some(board.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let renamed = json!({"id": "b1", "name": "late night", "rooms": []});
        let response = app
            .clone()
            .oneshot(request(Method::PUT, "/api/boards/b2", Some(renamed.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(request(Method::PUT, "/api/boards/b1", Some(renamed.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/boards", None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!([renamed]));

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, "/api/boards/b1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(Method::GET, "/api/boards/b1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_missing_board_is_not_found() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .oneshot(request(
                Method::PUT,
                "/api/boards/ghost",
                Some(json!({"id": "ghost", "name": "g"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_board_is_rejected() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/boards",
                Some(json!({"id": "b1", "name": ""})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"][0]["field"], "name");
    }

    #[tokio::test]
    async fn test_cookie_round_trip() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/settings/bilibili/cookie", None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!({"cookie": ""}));

        let response = app
            .clone()
            .oneshot(request(
                Method::PUT,
                "/api/settings/bilibili/cookie",
                Some(json!({"cookie": "SESSDATA=abc"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(Method::GET, "/api/settings/bilibili/cookie", None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!({"cookie": "SESSDATA=abc"}));
    }

    #[tokio::test]
    async fn test_health_reports_stopped_proxy_as_degraded() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .oneshot(request(Method::GET, "/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["checks"]["proxy"]["status"], "degraded");
        assert_eq!(json["checks"]["platforms"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_openapi_document_lists_nested_paths() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .oneshot(request(Method::GET, OPENAPI_JSON_PATH, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let paths = json["paths"].as_object().unwrap();
        assert!(paths.contains_key("/api/platforms/{platform_id}/rooms/{room_id}"));
        assert!(paths.contains_key("/api/boards/{board_id}"));
        assert!(paths.contains_key("/health"));
    }

    #[tokio::test]
    async fn test_api_answers_cors_preflight() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let preflight = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/platforms")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(preflight).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_mount_errors_are_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .oneshot(request(Method::GET, "/cors", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "origin is required"})
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_normalized() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        let response = app
            .oneshot(request(Method::GET, "/nowhere", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }
}
