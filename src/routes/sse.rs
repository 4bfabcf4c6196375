use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/boards",
    tag = "live",
    responses((status = 200, description = "Board update stream (`updateBoard`, `boardsCleared`)", content_type = "text/event-stream", body = String))
)]
/// Stream board updates to read-only viewers.
pub async fn board_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    info!(viewers = state.hub().viewer_count(), "new board SSE connection");
    sse_service::to_sse_stream(receiver)
}

/// Configure the SSE routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/boards", get(board_stream))
}
