use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the degraded flag and viewer count while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.board_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    let viewers = state.hub().viewer_count();
    if state.is_degraded() {
        HealthResponse::degraded(viewers)
    } else {
        HealthResponse::ok(viewers)
    }
}
