use tracing::debug;

use crate::{
    dto::{board::BoardView, live::BoardEvent},
    state::BoardHub,
};

/// Publish the new state of a board to every viewer.
pub fn broadcast_board_updated(hub: &BoardHub, view: BoardView) {
    debug!(
        username = %view.username,
        has_bingo = view.has_bingo,
        viewers = hub.viewer_count(),
        "broadcasting board update"
    );
    hub.broadcast(BoardEvent::Updated(view));
}

/// Tell every viewer that all boards were dropped.
pub fn broadcast_boards_cleared(hub: &BoardHub) {
    debug!(viewers = hub.viewer_count(), "broadcasting boards cleared");
    hub.broadcast(BoardEvent::Cleared);
}
