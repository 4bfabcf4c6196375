use std::{str::FromStr, time::Duration};

use sqlx::sqlite::SqliteConnectOptions;

use super::error::{SqliteDaoError, SqliteResult};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection settings for [`super::SqliteBoardStore`].
#[derive(Clone, Debug)]
pub struct SqliteConfig {
    /// Parsed URL plus the pragmas applied to every connection.
    pub options: SqliteConnectOptions,
    /// Upper bound of the connection pool.
    pub max_connections: u32,
    /// Idle connections are never recycled, which keeps `sqlite::memory:` databases alive.
    pub keep_connections: bool,
}

impl SqliteConfig {
    /// Parse a `sqlite://` URL; the database file is created when missing.
    pub fn from_url(url: &str, max_connections: Option<u32>) -> SqliteResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|source| SqliteDaoError::InvalidUrl {
                url: url.to_owned(),
                source,
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        Ok(Self {
            options,
            max_connections: max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
            keep_connections: false,
        })
    }

    /// Private in-memory database backed by a single pooled connection.
    pub fn in_memory() -> Self {
        Self {
            options: SqliteConnectOptions::new()
                .in_memory(true)
                .foreign_keys(true),
            max_connections: 1,
            keep_connections: true,
        }
    }
}
