use axum::{
    Extension, Json, Router,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::{
    dto::board::{BoardView, BoardsResponse, ToggleRequest, ToggleResponse},
    error::AppError,
    routes::extract::{JsonOrForm, wants_json},
    services::board_service,
    state::{SharedState, session::Session},
};

/// Board routes; all of them run behind the session middleware.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/bingo", get(list_boards))
        .route("/bingo/board", get(own_board))
        .route("/bingo/toggle", post(toggle))
        .route("/bingo/reset", post(reset))
}

#[utoipa::path(
    get,
    path = "/bingo",
    tag = "bingo",
    responses(
        (status = 200, description = "Every board plus the viewer", body = BoardsResponse),
        (status = 303, description = "No session, redirected to /"),
        (status = 401, description = "No session (JSON clients)")
    )
)]
/// All boards ordered by position, with the viewer's username.
pub async fn list_boards(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<BoardsResponse>, AppError> {
    let boards = board_service::list_boards(&state).await.map_err(|err| {
        err.log_failure("list_boards", &session.username);
        AppError::from(err)
    })?;
    Ok(Json(BoardsResponse {
        viewer: session.username,
        boards,
    }))
}

#[utoipa::path(
    get,
    path = "/bingo/board",
    tag = "bingo",
    responses(
        (status = 200, description = "The caller's board", body = BoardView),
        (status = 404, description = "No board provisioned yet")
    )
)]
/// The caller's own board.
pub async fn own_board(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<BoardView>, AppError> {
    let view = board_service::get_board(&state, &session.username)
        .await
        .map_err(|err| {
            err.log_failure("get_board", &session.username);
            AppError::from(err)
        })?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/bingo/toggle",
    tag = "bingo",
    request_body(content = ToggleRequest, description = "JSON or urlencoded form"),
    responses(
        (status = 200, description = "Cell toggled", body = ToggleResponse),
        (status = 303, description = "Form clients are redirected to /bingo"),
        (status = 403, description = "Cell belongs to another user"),
        (status = 404, description = "Unknown cell")
    )
)]
/// Toggle one of the caller's cells and broadcast the new board.
pub async fn toggle(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    payload: Result<JsonOrForm<ToggleRequest>, AppError>,
) -> Response {
    let json = wants_json(&headers);

    let result = async {
        let JsonOrForm(request) = payload?;
        board_service::toggle_and_broadcast(&state, &session.username, request.id)
            .await
            .map_err(|err| {
                err.log_failure("toggle", &session.username);
                AppError::from(err)
            })
    }
    .await;

    match result {
        Ok(view) if json => Json(ToggleResponse::from(view)).into_response(),
        Err(err) if json => err.into_response(),
        _ => Redirect::to("/bingo").into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/bingo/reset",
    tag = "bingo",
    responses(
        (status = 200, description = "Fresh board", body = BoardView),
        (status = 303, description = "Form clients are redirected to /bingo")
    )
)]
/// Replace the caller's board with a freshly sampled one.
pub async fn reset(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
) -> Response {
    let result = board_service::reset_board(&state, &session.username)
        .await
        .map_err(|err| {
            err.log_failure("reset_board", &session.username);
            AppError::from(err)
        });

    if !wants_json(&headers) {
        return Redirect::to("/bingo").into_response();
    }
    match result {
        Ok(view) => Json(view).into_response(),
        Err(err) => err.into_response(),
    }
}
