use axum::{Router, middleware};

use crate::state::SharedState;

/// Maintenance endpoints guarded by the admin token.
pub mod admin;
/// Signup, login and logout.
pub mod auth;
/// Board pages, toggles and per-user resets.
pub mod bingo;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Extractors accepting JSON or form bodies.
pub mod extract;
/// Health check.
pub mod health;
/// Session token lookup and the session middleware.
pub mod session;
/// Server-sent events stream for read-only viewers.
pub mod sse;
/// Live board WebSocket.
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let session_router = bingo::router()
        .merge(websocket::router())
        .merge(auth::session_router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    let api_router = health::router()
        .merge(sse::router())
        .merge(auth::router())
        .merge(session_router)
        .merge(admin::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
