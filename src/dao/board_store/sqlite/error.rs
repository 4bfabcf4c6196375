//! Error types shared by the SQLite storage implementation.

use thiserror::Error;
use uuid::Uuid;

/// Convenient result alias returning [`SqliteDaoError`] failures.
pub type SqliteResult<T> = Result<T, SqliteDaoError>;

/// Failures that can occur while interacting with SQLite.
#[derive(Debug, Error)]
pub enum SqliteDaoError {
    /// The configured database URL could not be parsed.
    #[error("invalid SQLite url `{url}`")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Opening the connection pool failed.
    #[error("failed to connect to SQLite")]
    Connect {
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Creating tables or indexes failed.
    #[error("failed to apply SQLite schema `{statement}`")]
    Schema {
        /// Statement that failed.
        statement: &'static str,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Health ping against the pool failed.
    #[error("SQLite health ping failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// A query failed while performing `operation`.
    #[error("SQLite query failed during {operation}")]
    Query {
        /// Store operation being performed.
        operation: &'static str,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// A unique or foreign-key constraint rejected the write.
    #[error("{message}")]
    Constraint {
        /// Operation-level description.
        message: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// A stored cell id is not a valid UUID.
    #[error("invalid cell id `{value}` stored in SQLite")]
    InvalidCellId {
        /// Raw column value.
        value: String,
        /// Parse error.
        #[source]
        source: uuid::Error,
    },
    /// A stored position does not fit on a board.
    #[error("invalid position {position} stored for cell `{id}`")]
    InvalidPosition {
        /// Cell carrying the bad value.
        id: Uuid,
        /// Raw column value.
        position: i64,
    },
}

impl SqliteDaoError {
    /// Classify a query failure, separating constraint violations from outages.
    pub(super) fn query(operation: &'static str, source: sqlx::Error) -> Self {
        let constraint = source
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation() || db.is_foreign_key_violation());
        if constraint {
            SqliteDaoError::Constraint {
                message: format!("constraint violated during {operation}"),
                source,
            }
        } else {
            SqliteDaoError::Query { operation, source }
        }
    }
}
