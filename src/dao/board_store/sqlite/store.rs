use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future::BoxFuture;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqlitePoolOptions, SqliteRow},
};
use uuid::Uuid;

use super::{
    config::SqliteConfig,
    error::{SqliteDaoError, SqliteResult},
};
use crate::dao::{
    board_store::BoardStore,
    models::{CellEntity, UserEntity},
    storage::StorageResult,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS phrases (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS users (
        username TEXT PRIMARY KEY,
        password_hash TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS board_cells (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
        phrase_text TEXT NOT NULL,
        checked INTEGER NOT NULL DEFAULT 0,
        position INTEGER,
        UNIQUE (username, position)
    )",
    "CREATE INDEX IF NOT EXISTS board_cells_owner_idx ON board_cells (username, position)",
];

const CELL_COLUMNS: &str = "id, username, phrase_text, checked, position";
const DISPLAY_ORDER: &str = "position IS NULL, position, seq";
const ALL_CELLS_QUERY: &str = "SELECT c.id, c.username, c.phrase_text, c.checked, c.position
     FROM board_cells c JOIN users u ON u.username = c.username
     ORDER BY u.created_at, u.rowid, c.position IS NULL, c.position, c.seq";

/// [`BoardStore`] backed by a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteBoardStore {
    pool: SqlitePool,
}

impl SqliteBoardStore {
    /// Open the pool and make sure the schema exists.
    pub async fn connect(config: SqliteConfig) -> SqliteResult<Self> {
        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.keep_connections {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options
            .connect_with(config.options)
            .await
            .map_err(|source| SqliteDaoError::Connect { source })?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> SqliteResult<()> {
        for &statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|source| SqliteDaoError::Schema { statement, source })?;
        }
        Ok(())
    }

    async fn seed_phrases(&self, phrases: Vec<String>) -> SqliteResult<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| SqliteDaoError::query("seed phrases", source))?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM phrases")
            .fetch_one(&mut *tx)
            .await
            .map_err(|source| SqliteDaoError::query("count phrases", source))?;

        if existing == 0 {
            for phrase in &phrases {
                sqlx::query("INSERT OR IGNORE INTO phrases (text) VALUES (?)")
                    .bind(phrase)
                    .execute(&mut *tx)
                    .await
                    .map_err(|source| SqliteDaoError::query("seed phrases", source))?;
            }
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM phrases")
            .fetch_one(&mut *tx)
            .await
            .map_err(|source| SqliteDaoError::query("count phrases", source))?;

        tx.commit()
            .await
            .map_err(|source| SqliteDaoError::query("seed phrases", source))?;
        Ok(total as usize)
    }

    async fn list_phrases(&self) -> SqliteResult<Vec<String>> {
        sqlx::query_scalar("SELECT text FROM phrases ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|source| SqliteDaoError::query("list phrases", source))
    }

    async fn find_user(&self, username: String) -> SqliteResult<Option<UserEntity>> {
        let row = sqlx::query(
            "SELECT username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(&username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| SqliteDaoError::query("find user", source))?;

        Ok(row.map(|row| UserEntity {
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            created_at: from_unix_seconds(row.get("created_at")),
        }))
    }

    async fn create_user(&self, user: UserEntity) -> SqliteResult<()> {
        sqlx::query("INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)")
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(to_unix_seconds(user.created_at))
            .execute(&self.pool)
            .await
            .map_err(|source| SqliteDaoError::query("create user", source))?;
        Ok(())
    }

    async fn list_cells(&self, username: String) -> SqliteResult<Vec<CellEntity>> {
        let query = format!(
            "SELECT {CELL_COLUMNS} FROM board_cells WHERE username = ? ORDER BY {DISPLAY_ORDER}"
        );
        sqlx::query(&query)
            .bind(&username)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| SqliteDaoError::query("list cells", source))?
            .iter()
            .map(cell_from_row)
            .collect()
    }

    async fn list_all_cells(&self) -> SqliteResult<Vec<CellEntity>> {
        sqlx::query(ALL_CELLS_QUERY)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| SqliteDaoError::query("list all cells", source))?
            .iter()
            .map(cell_from_row)
            .collect()
    }

    async fn find_cell(&self, id: Uuid) -> SqliteResult<Option<CellEntity>> {
        let query = format!("SELECT {CELL_COLUMNS} FROM board_cells WHERE id = ?");
        sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| SqliteDaoError::query("find cell", source))?
            .as_ref()
            .map(cell_from_row)
            .transpose()
    }

    async fn replace_board(&self, username: String, cells: Vec<CellEntity>) -> SqliteResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| SqliteDaoError::query("replace board", source))?;

        sqlx::query("DELETE FROM board_cells WHERE username = ?")
            .bind(&username)
            .execute(&mut *tx)
            .await
            .map_err(|source| SqliteDaoError::query("clear board", source))?;

        for cell in &cells {
            sqlx::query(
                "INSERT INTO board_cells (id, username, phrase_text, checked, position)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(cell.id.to_string())
            .bind(&username)
            .bind(&cell.phrase)
            .bind(cell.checked)
            .bind(cell.position.map(i64::from))
            .execute(&mut *tx)
            .await
            .map_err(|source| SqliteDaoError::query("insert cell", source))?;
        }

        // Dropping `tx` without committing rolls every statement back.
        tx.commit()
            .await
            .map_err(|source| SqliteDaoError::query("replace board", source))
    }

    async fn toggle_cell(&self, username: String, id: Uuid) -> SqliteResult<Option<CellEntity>> {
        let query = format!(
            "UPDATE board_cells SET checked = NOT checked
             WHERE id = ? AND username = ?
             RETURNING {CELL_COLUMNS}"
        );
        sqlx::query(&query)
            .bind(id.to_string())
            .bind(&username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| SqliteDaoError::query("toggle cell", source))?
            .as_ref()
            .map(cell_from_row)
            .transpose()
    }

    async fn reset_all(&self, phrases: Vec<String>) -> SqliteResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| SqliteDaoError::query("reset storage", source))?;

        for statement in [
            "DELETE FROM board_cells",
            "DELETE FROM users",
            "DELETE FROM phrases",
        ] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|source| SqliteDaoError::query("reset storage", source))?;
        }

        for phrase in &phrases {
            sqlx::query("INSERT OR IGNORE INTO phrases (text) VALUES (?)")
                .bind(phrase)
                .execute(&mut *tx)
                .await
                .map_err(|source| SqliteDaoError::query("reseed phrases", source))?;
        }

        tx.commit()
            .await
            .map_err(|source| SqliteDaoError::query("reset storage", source))
    }

    async fn ping(&self) -> SqliteResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|source| SqliteDaoError::HealthPing { source })?;
        Ok(())
    }
}

fn cell_from_row(row: &SqliteRow) -> SqliteResult<CellEntity> {
    let raw_id: String = row.get("id");
    let id = Uuid::parse_str(&raw_id).map_err(|source| SqliteDaoError::InvalidCellId {
        value: raw_id.clone(),
        source,
    })?;
    let position = row
        .get::<Option<i64>, _>("position")
        .map(|position| {
            u8::try_from(position).map_err(|_| SqliteDaoError::InvalidPosition { id, position })
        })
        .transpose()?;

    Ok(CellEntity {
        id,
        username: row.get("username"),
        phrase: row.get("phrase_text"),
        checked: row.get("checked"),
        position,
    })
}

fn to_unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

fn from_unix_seconds(seconds: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(seconds.max(0) as u64)
}

impl BoardStore for SqliteBoardStore {
    fn seed_phrases(&self, phrases: Vec<String>) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.seed_phrases(phrases).await?) })
    }

    fn list_phrases(&self) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_phrases().await?) })
    }

    fn find_user(&self, username: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_user(username).await?) })
    }

    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.create_user(user).await?) })
    }

    fn list_cells(&self, username: String) -> BoxFuture<'static, StorageResult<Vec<CellEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_cells(username).await?) })
    }

    fn list_all_cells(&self) -> BoxFuture<'static, StorageResult<Vec<CellEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_all_cells().await?) })
    }

    fn find_cell(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CellEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_cell(id).await?) })
    }

    fn replace_board(
        &self,
        username: String,
        cells: Vec<CellEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.replace_board(username, cells).await?) })
    }

    fn toggle_cell(
        &self,
        username: String,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CellEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.toggle_cell(username, id).await?) })
    }

    fn reset_all(&self, phrases: Vec<String>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.reset_all(phrases).await?) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.ping().await?) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        // The pool re-opens dropped connections on its own; a ping tells us whether it worked.
        self.health_check()
    }
}
