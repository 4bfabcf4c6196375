use axum::{
    Extension, Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};

use crate::{
    services::websocket_service,
    state::{SharedState, session::Session},
};

#[utoipa::path(
    get,
    path = "/ws",
    tag = "live",
    params(
        ("token" = Option<String>, Query, description = "Session token when no cookie or header is sent")
    ),
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 401, description = "No valid session")
    )
)]
/// Upgrade the HTTP connection into a live board WebSocket.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_service::handle_socket(state, socket, session))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws", get(ws_handler))
}
