use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::board::BoardShapeError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Missing or wrong credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The caller is authenticated but does not own the target.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The phrase pool cannot fill a board.
    #[error("phrase pool exhausted: {available} phrases available, {required} required")]
    PoolExhausted {
        /// Phrases currently in the pool.
        available: usize,
        /// Phrases one board needs.
        required: usize,
    },
    /// Unexpected failure outside storage (task join, hashing).
    #[error("internal error: {0}")]
    Internal(String),
    /// A stored board broke the 25-cell permutation invariant.
    #[error("board of `{username}` has an invalid shape")]
    InvalidBoardShape {
        /// Owner of the broken board.
        username: String,
        /// The violated rule.
        #[source]
        source: BoardShapeError,
    },
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl ServiceError {
    /// Log a failure caught at a request boundary with its operation and actor.
    ///
    /// Shape violations and storage outages are logged at error level, everything
    /// else is an expected client mistake and logged as a warning.
    pub fn log_failure(&self, operation: &str, username: &str) {
        match self {
            ServiceError::InvalidBoardShape { source, .. } => {
                error!(operation, username, error = %self, shape = %source, "board invariant violated");
            }
            ServiceError::Unavailable(source) => {
                error!(operation, username, error = %source, "storage failure");
            }
            ServiceError::Degraded
            | ServiceError::PoolExhausted { .. }
            | ServiceError::Internal(_) => {
                error!(operation, username, error = %self, "operation aborted");
            }
            _ => warn!(operation, username, error = %self, "operation rejected"),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated caller lacks access to the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        // Storage and invariant details stay in the logs, never in responses.
        match err {
            ServiceError::Unavailable(_) => AppError::ServiceUnavailable("storage unavailable".into()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::PoolExhausted { .. } => {
                AppError::ServiceUnavailable("not enough phrases to build a board".into())
            }
            ServiceError::InvalidBoardShape { .. } => {
                AppError::Internal("board data is inconsistent".into())
            }
            ServiceError::Internal(_) => AppError::Internal("unexpected failure".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl AppError {
    /// HTTP status matching the error kind.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code used in redirect query strings.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "invalid_input",
            AppError::Unauthorized(_) => "invalid_credentials",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::ServiceUnavailable(_) => "unavailable",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorBody {
            success: false,
            message: self.to_string(),
        });

        (self.status(), payload).into_response()
    }
}
