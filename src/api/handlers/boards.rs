//! Board handlers: saved room layouts.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::BOARD_TAG;
use crate::api::dto::ErrorResponse;
use crate::error::{AppError, AppResult};
use crate::services::views::BoardView;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Register board routes.
///
/// # Routes
/// - GET /boards
/// - POST /boards
/// - GET /boards/{board_id}
/// - PUT /boards/{board_id}
/// - DELETE /boards/{board_id}
pub fn board_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_boards, create_board))
        .routes(routes!(get_board, update_board, delete_board))
}

fn store_failure(operation: &str, board_id: &str) -> AppError {
    AppError::Internal {
        source: anyhow::anyhow!("failed to {operation} board '{board_id}'"),
    }
}

/// GET /api/boards - List saved boards.
#[utoipa::path(
    get,
    path = "/boards",
    tag = BOARD_TAG,
    responses(
        (status = 200, description = "All boards in insertion order", body = Vec<BoardView>)
    )
)]
async fn list_boards(State(state): State<AppState>) -> Json<Vec<BoardView>> {
    Json(state.services.boards.get_boards().await)
}

/// POST /api/boards - Save a new board.
#[utoipa::path(
    post,
    path = "/boards",
    tag = BOARD_TAG,
    request_body = BoardView,
    responses(
        (status = 201, description = "Board saved", body = BoardView),
        (status = 400, description = "Invalid board or duplicate id", body = ErrorResponse)
    )
)]
async fn create_board(
    State(state): State<AppState>,
    ValidatedJson(board): ValidatedJson<BoardView>,
) -> AppResult<(StatusCode, Json<BoardView>)> {
    let boards = &state.services.boards;
    if boards.get_board(&board.id).await.is_some() {
        return Err(AppError::BadRequest {
            message: format!("Board '{}' already exists", board.id),
        });
    }

    let board_id = board.id.clone();
    let saved = boards
        .add_board(board)
        .await
        .ok_or_else(|| store_failure("add", &board_id))?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/boards/{board_id} - Get one board.
#[utoipa::path(
    get,
    path = "/boards/{board_id}",
    tag = BOARD_TAG,
    params(
        ("board_id" = String, Path, description = "Board id")
    ),
    responses(
        (status = 200, description = "Board", body = BoardView),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> AppResult<Json<BoardView>> {
    state
        .services
        .boards
        .get_board(&board_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("Board", "id", board_id))
}

/// PUT /api/boards/{board_id} - Replace a board.
///
/// The id in the body must match the path.
#[utoipa::path(
    put,
    path = "/boards/{board_id}",
    tag = BOARD_TAG,
    request_body = BoardView,
    params(
        ("board_id" = String, Path, description = "Board id")
    ),
    responses(
        (status = 200, description = "Board updated", body = BoardView),
        (status = 400, description = "Invalid board or mismatched id", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
async fn update_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    ValidatedJson(board): ValidatedJson<BoardView>,
) -> AppResult<Json<BoardView>> {
    if board.id != board_id {
        return Err(AppError::BadRequest {
            message: format!(
                "Board id '{}' does not match path id '{board_id}'",
                board.id
            ),
        });
    }

    let boards = &state.services.boards;
    if boards.get_board(&board_id).await.is_none() {
        return Err(AppError::not_found("Board", "id", board_id));
    }
    boards
        .update_board(board)
        .await
        .map(Json)
        .ok_or_else(|| store_failure("update", &board_id))
}

/// DELETE /api/boards/{board_id} - Remove a board.
#[utoipa::path(
    delete,
    path = "/boards/{board_id}",
    tag = BOARD_TAG,
    params(
        ("board_id" = String, Path, description = "Board id")
    ),
    responses(
        (status = 200, description = "The removed board", body = BoardView),
        (status = 404, description = "Board not found", body = ErrorResponse)
    )
)]
async fn delete_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> AppResult<Json<BoardView>> {
    let boards = &state.services.boards;
    if boards.get_board(&board_id).await.is_none() {
        return Err(AppError::not_found("Board", "id", board_id));
    }
    boards
        .remove_board(&board_id)
        .await
        .map(Json)
        .ok_or_else(|| store_failure("remove", &board_id))
}
