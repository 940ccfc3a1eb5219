//! Settings handlers.

use axum::{Json, extract::State};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::SETTING_TAG;
use crate::api::dto::{CookieResponse, ErrorResponse, UpdateCookieRequest};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Register settings routes.
pub fn setting_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_bili_cookie, set_bili_cookie))
}

/// GET /api/settings/bilibili/cookie - Read the stored bilibili cookie.
#[utoipa::path(
    get,
    path = "/settings/bilibili/cookie",
    tag = SETTING_TAG,
    responses(
        (status = 200, description = "Stored cookie, empty when unset", body = CookieResponse)
    )
)]
async fn get_bili_cookie(State(state): State<AppState>) -> Json<CookieResponse> {
    let cookie = state.services.settings.get_bili_cookie().await;
    Json(CookieResponse { cookie })
}

/// PUT /api/settings/bilibili/cookie - Replace the bilibili cookie.
///
/// Sent with every later bilibili API request.
#[utoipa::path(
    put,
    path = "/settings/bilibili/cookie",
    tag = SETTING_TAG,
    request_body = UpdateCookieRequest,
    responses(
        (status = 200, description = "Cookie stored", body = CookieResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
async fn set_bili_cookie(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpdateCookieRequest>,
) -> AppResult<Json<CookieResponse>> {
    let requested = req.cookie;
    let cookie = state
        .services
        .settings
        .set_bili_cookie(requested.clone())
        .await;
    if cookie != requested {
        return Err(AppError::Internal {
            source: anyhow::anyhow!("failed to store bilibili cookie"),
        });
    }
    Ok(Json(CookieResponse { cookie }))
}
