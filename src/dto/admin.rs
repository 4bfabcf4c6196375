//! DTO definitions used by the maintenance endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Outcome of a full maintenance reset.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResetResponse {
    /// Human readable confirmation.
    pub message: String,
    /// Sessions revoked by the reset.
    pub sessions_revoked: usize,
    /// Size of the reseeded phrase pool.
    pub phrases: usize,
}
