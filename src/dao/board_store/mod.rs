pub mod memory;
/// SQLite backend.
#[cfg(feature = "sqlite-store")]
pub mod sqlite;

use crate::dao::models::{CellEntity, UserEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for users, boards and the phrase pool.
///
/// Cell listings are returned in display order: by position, then by insertion
/// order for rows persisted without a position.
pub trait BoardStore: Send + Sync {
    /// Insert `phrases` when the pool is empty; returns the resulting pool size.
    fn seed_phrases(&self, phrases: Vec<String>) -> BoxFuture<'static, StorageResult<usize>>;
    fn list_phrases(&self) -> BoxFuture<'static, StorageResult<Vec<String>>>;

    fn find_user(&self, username: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Fails with a constraint error when the username is taken.
    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;

    fn list_cells(&self, username: String) -> BoxFuture<'static, StorageResult<Vec<CellEntity>>>;
    /// Every user's cells, grouped by username in signup order.
    fn list_all_cells(&self) -> BoxFuture<'static, StorageResult<Vec<CellEntity>>>;
    fn find_cell(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CellEntity>>>;
    /// Atomically drop every cell owned by `username` and insert `cells`.
    fn replace_board(
        &self,
        username: String,
        cells: Vec<CellEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Flip `checked` on the cell `id` if `username` owns it, returning the updated row.
    fn toggle_cell(
        &self,
        username: String,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CellEntity>>>;

    /// Drop every user and board and reseed the phrase pool with `phrases`.
    fn reset_all(&self, phrases: Vec<String>) -> BoxFuture<'static, StorageResult<()>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
