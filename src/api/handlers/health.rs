//! Health check endpoint handlers.
//!
//! Reports whether the local proxy is listening and whether any platform
//! resolver is registered. Neither check touches the network.

use std::collections::BTreeMap;

use axum::{Json, extract::State, http::StatusCode};
use jiff::Timestamp;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::state::AppState;

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Component health report
/// - `GET /health/ready` - Readiness probe
/// - `GET /health/live` - Liveness probe
pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(readiness_check))
        .routes(routes!(liveness_check))
}

/// Basic health check endpoint.
///
/// A stopped proxy or an empty platform registry degrades the service;
/// resolution still answers but images and streams cannot be proxied.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = BTreeMap::new();
    checks.insert("proxy".to_string(), check_proxy(&state));
    checks.insert("platforms".to_string(), check_platforms(&state));

    let status = checks
        .values()
        .map(|c| c.status)
        .max()
        .unwrap_or(HealthStatus::Healthy);

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Timestamp::now().to_string(),
        checks,
    };

    let code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(response))
}

/// Readiness probe endpoint.
///
/// Ready once the proxy is listening.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Service is not ready")
    ),
    tag = HEALTH_TAG
)]
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match check_proxy(&state).status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded | HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Liveness probe endpoint.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive")
    ),
    tag = HEALTH_TAG
)]
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

fn check_proxy(state: &AppState) -> ComponentHealth {
    match state.services.proxy().base_url() {
        Some(url) => ComponentHealth::new(HealthStatus::Healthy, format!("Listening on {url}")),
        None => ComponentHealth::new(HealthStatus::Degraded, "Proxy is not running"),
    }
}

fn check_platforms(state: &AppState) -> ComponentHealth {
    let count = state.services.platforms.list_platforms().len();
    if count == 0 {
        ComponentHealth::new(HealthStatus::Degraded, "No platform registered")
    } else {
        ComponentHealth::new(
            HealthStatus::Healthy,
            format!("{count} platform(s) registered"),
        )
    }
}
