mod config;
mod error;
mod store;

pub use config::SqliteConfig;
pub use error::SqliteDaoError;
pub use store::SqliteBoardStore;

use crate::dao::storage::StorageError;

impl From<SqliteDaoError> for StorageError {
    fn from(err: SqliteDaoError) -> Self {
        match err {
            SqliteDaoError::Constraint { message, .. } => StorageError::constraint(message),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
