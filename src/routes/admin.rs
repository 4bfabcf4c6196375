use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::post,
};
use tracing::warn;

use crate::{
    dto::admin::ResetResponse,
    error::AppError,
    services::maintenance_service,
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Maintenance endpoints guarded by the configured admin token.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/reset", post(reset_all))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Drop every user, board and session and reseed the phrase pool.
#[utoipa::path(
    post,
    path = "/admin/reset",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Token configured with BINGO_ADMIN_TOKEN")),
    responses(
        (status = 200, description = "Everything was reset", body = ResetResponse),
        (status = 401, description = "Missing or wrong admin token"),
        (status = 404, description = "Maintenance endpoints are disabled")
    )
)]
/// Wipe all users, boards and sessions and reseed the phrase pool.
pub async fn reset_all(State(state): State<SharedState>) -> Result<Json<ResetResponse>, AppError> {
    let summary = maintenance_service::reset_all(&state).await.map_err(|err| {
        err.log_failure("admin_reset", "admin");
        AppError::from(err)
    })?;
    Ok(Json(ResetResponse {
        message: "all boards cleared".into(),
        sessions_revoked: summary.sessions_revoked,
        phrases: summary.phrases,
    }))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let config = state.config();
    let Some(expected) = config.admin_token() else {
        return Err(AppError::NotFound("maintenance endpoints are disabled".into()));
    };

    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    if provided != expected {
        warn!("rejected maintenance call with an invalid admin token");
        return Err(AppError::Unauthorized("invalid admin token".into()));
    }
    Ok(next.run(req).await)
}
