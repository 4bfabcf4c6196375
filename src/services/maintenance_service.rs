//! Maintenance reset: wipe every user, board and session.

use tracing::info;

use crate::{
    error::ServiceError,
    services::board_events,
    state::SharedState,
};

/// What a maintenance reset removed and restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSummary {
    /// Sessions that were active before the reset.
    pub sessions_revoked: usize,
    /// Size of the reseeded phrase pool.
    pub phrases: usize,
}

/// Drop all users and boards, reseed the phrase pool from configuration,
/// revoke every session and tell viewers that the boards are gone.
///
/// Board gates are left in place: a toggle still running for a dropped user
/// keeps serializing with whatever that username does next.
pub async fn reset_all(state: &SharedState) -> Result<ResetSummary, ServiceError> {
    let store = state.require_board_store().await?;
    let phrases = state.config().phrases().to_vec();
    let pool_size = phrases.len();

    store.reset_all(phrases).await?;
    let sessions_revoked = state.sessions().clear();
    board_events::broadcast_boards_cleared(state.hub());

    info!(sessions_revoked, phrases = pool_size, "maintenance reset completed");
    Ok(ResetSummary {
        sessions_revoked,
        phrases: pool_size,
    })
}
