//! Platform handlers: descriptors, rooms, qualities and stream URLs.

use axum::{
    Json,
    extract::{Path, State},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::PLATFORM_TAG;
use crate::error::{AppError, AppResult};
use crate::services::views::{PlatformView, QualityView, RoomView};
use crate::state::AppState;

/// Register platform routes.
///
/// # Routes
/// - GET /platforms
/// - GET /platforms/{platform_id}
/// - GET /platforms/{platform_id}/rooms/{room_id}
/// - GET /platforms/{platform_id}/rooms/{room_id}/qualities
/// - GET /platforms/{platform_id}/rooms/{room_id}/qualities/{quality_id}/urls
pub fn platform_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_platforms))
        .routes(routes!(get_platform))
        .routes(routes!(get_room))
        .routes(routes!(get_qualities))
        .routes(routes!(get_live_urls))
}

/// An unknown platform is reported as such; anything else the facade
/// swallowed is reported against the room.
fn missing(state: &AppState, platform_id: &str, room_id: &str) -> AppError {
    if state.services.platforms.get_platform(platform_id).is_none() {
        AppError::not_found("Platform", "id", platform_id)
    } else {
        AppError::not_found("Room", "id", room_id)
    }
}

/// GET /api/platforms - List registered platforms.
#[utoipa::path(
    get,
    path = "/platforms",
    tag = PLATFORM_TAG,
    responses(
        (status = 200, description = "Registered platforms ordered by id", body = Vec<PlatformView>)
    )
)]
async fn list_platforms(State(state): State<AppState>) -> Json<Vec<PlatformView>> {
    Json(state.services.platforms.list_platforms())
}

/// GET /api/platforms/{platform_id} - Get one platform descriptor.
#[utoipa::path(
    get,
    path = "/platforms/{platform_id}",
    tag = PLATFORM_TAG,
    params(
        ("platform_id" = String, Path, description = "Platform id, e.g. bili")
    ),
    responses(
        (status = 200, description = "Platform descriptor", body = PlatformView),
        (status = 404, description = "Unknown platform", body = crate::api::dto::ErrorResponse)
    )
)]
async fn get_platform(
    State(state): State<AppState>,
    Path(platform_id): Path<String>,
) -> AppResult<Json<PlatformView>> {
    state
        .services
        .platforms
        .get_platform(&platform_id)
        .map(Json)
        .ok_or_else(|| AppError::not_found("Platform", "id", platform_id))
}

/// GET /api/platforms/{platform_id}/rooms/{room_id} - Resolve a room.
///
/// `room_id` may be an alias; the response carries the canonical id.
#[utoipa::path(
    get,
    path = "/platforms/{platform_id}/rooms/{room_id}",
    tag = PLATFORM_TAG,
    params(
        ("platform_id" = String, Path, description = "Platform id"),
        ("room_id" = String, Path, description = "Canonical room id or alias")
    ),
    responses(
        (status = 200, description = "Room information", body = RoomView),
        (status = 404, description = "Unknown platform or room", body = crate::api::dto::ErrorResponse)
    )
)]
async fn get_room(
    State(state): State<AppState>,
    Path((platform_id, room_id)): Path<(String, String)>,
) -> AppResult<Json<RoomView>> {
    match state.services.platforms.get_room(&platform_id, &room_id).await {
        Some(room) => Ok(Json(room)),
        None => Err(missing(&state, &platform_id, &room_id)),
    }
}

/// GET /api/platforms/{platform_id}/rooms/{room_id}/qualities - List qualities.
#[utoipa::path(
    get,
    path = "/platforms/{platform_id}/rooms/{room_id}/qualities",
    tag = PLATFORM_TAG,
    params(
        ("platform_id" = String, Path, description = "Platform id"),
        ("room_id" = String, Path, description = "Canonical room id or alias")
    ),
    responses(
        (status = 200, description = "Qualities, most preferred first; empty when offline", body = Vec<QualityView>),
        (status = 404, description = "Unknown platform or room", body = crate::api::dto::ErrorResponse)
    )
)]
async fn get_qualities(
    State(state): State<AppState>,
    Path((platform_id, room_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<QualityView>>> {
    match state
        .services
        .platforms
        .get_qualities(&platform_id, &room_id)
        .await
    {
        Some(qualities) => Ok(Json(qualities)),
        None => Err(missing(&state, &platform_id, &room_id)),
    }
}

/// GET /api/platforms/{platform_id}/rooms/{room_id}/qualities/{quality_id}/urls
#[utoipa::path(
    get,
    path = "/platforms/{platform_id}/rooms/{room_id}/qualities/{quality_id}/urls",
    tag = PLATFORM_TAG,
    params(
        ("platform_id" = String, Path, description = "Platform id"),
        ("room_id" = String, Path, description = "Canonical room id or alias"),
        ("quality_id" = String, Path, description = "Quality id from the qualities listing")
    ),
    responses(
        (status = 200, description = "Stream URLs, least reliable hosts last", body = Vec<String>),
        (status = 404, description = "Unknown platform or room", body = crate::api::dto::ErrorResponse)
    )
)]
async fn get_live_urls(
    State(state): State<AppState>,
    Path((platform_id, room_id, quality_id)): Path<(String, String, String)>,
) -> AppResult<Json<Vec<String>>> {
    match state
        .services
        .platforms
        .get_live_urls(&platform_id, &room_id, &quality_id)
        .await
    {
        Some(urls) => Ok(Json(urls)),
        None => Err(missing(&state, &platform_id, &room_id)),
    }
}
