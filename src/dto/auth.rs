//! Payloads of the `/auth` endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::validation::validate_username;

/// Credentials submitted to `/auth`, either as JSON or as a urlencoded form.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthRequest {
    /// 3 to 32 ASCII letters, digits, `_` or `-`.
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    /// Plain password, hashed before it is stored.
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Returned to JSON clients after a successful signup or login.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Logged-in user.
    pub username: String,
    /// Session token, also set as the `bingo_session` cookie.
    pub token: String,
    /// True when this request created the account.
    pub created: bool,
}
