/// Signup and login.
pub mod auth_service;
/// Live update publication helpers.
pub mod board_events;
/// Board reads, toggles and per-user resets.
pub mod board_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Full maintenance reset.
pub mod maintenance_service;
/// Board provisioning from the phrase pool.
pub mod provisioner;
/// Server-Sent Events forwarding.
pub mod sse_service;
/// Storage connection supervisor with backoff and degraded mode.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
