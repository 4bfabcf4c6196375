//! Library crate for bingo-back, exposing modules for binaries and integration tests.

pub mod config;
/// Persistence layer: storage trait, models and backends.
pub mod dao;
/// Request, response and live message payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP route handlers.
pub mod routes;
/// Application services behind the routes.
pub mod services;
/// Shared runtime state and the board domain model.
pub mod state;
