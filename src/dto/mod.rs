pub mod admin;
/// Signup and login payloads.
pub mod auth;
pub mod board;
/// Health check payload.
pub mod health;
pub mod live;
pub mod validation;
