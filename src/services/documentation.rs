use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Bingo Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::authenticate,
        crate::routes::auth::logout,
        crate::routes::bingo::list_boards,
        crate::routes::bingo::own_board,
        crate::routes::bingo::toggle,
        crate::routes::bingo::reset,
        crate::routes::sse::board_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::admin::reset_all,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::auth::AuthRequest,
            crate::dto::auth::AuthResponse,
            crate::dto::board::CellDto,
            crate::dto::board::BoardView,
            crate::dto::board::BoardsResponse,
            crate::dto::board::ToggleRequest,
            crate::dto::board::ToggleResponse,
            crate::dto::live::ClientMessage,
            crate::dto::live::ServerMessage,
            crate::dto::admin::ResetResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Signup, login and logout"),
        (name = "bingo", description = "Board reads and cell toggles"),
        (name = "live", description = "WebSocket and server-sent events streams"),
        (name = "admin", description = "Maintenance operations"),
    )
)]
/// OpenAPI document of every public route.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_public_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/auth",
            "/logout",
            "/bingo",
            "/bingo/board",
            "/bingo/toggle",
            "/bingo/reset",
            "/sse/boards",
            "/ws",
            "/admin/reset",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
