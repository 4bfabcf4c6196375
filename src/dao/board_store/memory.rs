//! In-process storage backend used by tests and ephemeral deployments.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    board_store::BoardStore,
    models::{CellEntity, UserEntity},
    storage::{StorageError, StorageResult},
};

/// Failures of the in-memory backend.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    /// The store was switched offline, see [`MemoryBoardStore::set_online`].
    #[error("memory store is offline")]
    Offline,
}

impl From<MemoryStoreError> for StorageError {
    fn from(err: MemoryStoreError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

#[derive(Default)]
struct MemoryInner {
    phrases: Vec<String>,
    users: IndexMap<String, UserEntity>,
    boards: HashMap<String, Vec<CellEntity>>,
}

/// [`BoardStore`] keeping everything behind a single async lock.
#[derive(Clone, Default)]
pub struct MemoryBoardStore {
    inner: Arc<RwLock<MemoryInner>>,
    offline: Arc<AtomicBool>,
}

impl MemoryBoardStore {
    /// Empty, online store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a storage outage: while offline every operation fails.
    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), MemoryStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(MemoryStoreError::Offline)
        } else {
            Ok(())
        }
    }
}

fn display_order(mut cells: Vec<CellEntity>) -> Vec<CellEntity> {
    // Stable sort keeps insertion order for rows without a position.
    cells.sort_by_key(|cell| (cell.position.is_none(), cell.position));
    cells
}

impl BoardStore for MemoryBoardStore {
    fn seed_phrases(&self, phrases: Vec<String>) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut guard = store.inner.write().await;
            if guard.phrases.is_empty() {
                guard.phrases = phrases;
            }
            Ok(guard.phrases.len())
        })
    }

    fn list_phrases(&self) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store.inner.read().await.phrases.clone())
        })
    }

    fn find_user(&self, username: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store.inner.read().await.users.get(&username).cloned())
        })
    }

    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut guard = store.inner.write().await;
            if guard.users.contains_key(&user.username) {
                return Err(StorageError::constraint(format!(
                    "user `{}` already exists",
                    user.username
                )));
            }
            guard.users.insert(user.username.clone(), user);
            Ok(())
        })
    }

    fn list_cells(&self, username: String) -> BoxFuture<'static, StorageResult<Vec<CellEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let guard = store.inner.read().await;
            let cells = guard.boards.get(&username).cloned().unwrap_or_default();
            Ok(display_order(cells))
        })
    }

    fn list_all_cells(&self) -> BoxFuture<'static, StorageResult<Vec<CellEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let guard = store.inner.read().await;
            let cells = guard
                .users
                .keys()
                .filter_map(|username| guard.boards.get(username))
                .flat_map(|cells| display_order(cells.clone()))
                .collect();
            Ok(cells)
        })
    }

    fn find_cell(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CellEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let guard = store.inner.read().await;
            Ok(guard
                .boards
                .values()
                .flatten()
                .find(|cell| cell.id == id)
                .cloned())
        })
    }

    fn replace_board(
        &self,
        username: String,
        cells: Vec<CellEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut guard = store.inner.write().await;
            if !guard.users.contains_key(&username) {
                return Err(StorageError::constraint(format!(
                    "cannot store a board for unknown user `{username}`"
                )));
            }
            if let Some(cell) = cells.iter().find(|cell| cell.username != username) {
                return Err(StorageError::constraint(format!(
                    "cell `{}` belongs to `{}`, not `{username}`",
                    cell.id, cell.username
                )));
            }
            guard.boards.insert(username, cells);
            Ok(())
        })
    }

    fn toggle_cell(
        &self,
        username: String,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CellEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut guard = store.inner.write().await;
            let toggled = guard
                .boards
                .get_mut(&username)
                .and_then(|cells| cells.iter_mut().find(|cell| cell.id == id))
                .map(|cell| {
                    cell.checked = !cell.checked;
                    cell.clone()
                });
            Ok(toggled)
        })
    }

    fn reset_all(&self, phrases: Vec<String>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let mut guard = store.inner.write().await;
            *guard = MemoryInner {
                phrases,
                ..MemoryInner::default()
            };
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.check_online()?) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn user(name: &str) -> UserEntity {
        UserEntity {
            username: name.into(),
            password_hash: "hash".into(),
            created_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn seeding_only_fills_an_empty_pool() {
        let store = MemoryBoardStore::new();
        assert_eq!(store.seed_phrases(vec!["a".into(), "b".into()]).await.unwrap(), 2);
        assert_eq!(store.seed_phrases(vec!["c".into()]).await.unwrap(), 2);
        assert_eq!(store.list_phrases().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn duplicate_user_is_a_constraint_error() {
        let store = MemoryBoardStore::new();
        store.create_user(user("alice")).await.unwrap();
        let err = store.create_user(user("alice")).await.unwrap_err();
        assert!(matches!(err, StorageError::Constraint { .. }));
    }

    #[tokio::test]
    async fn board_for_unknown_user_is_rejected() {
        let store = MemoryBoardStore::new();
        let err = store
            .replace_board("ghost".into(), vec![CellEntity::new("ghost", "x", 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Constraint { .. }));
    }

    #[tokio::test]
    async fn toggle_requires_ownership() {
        let store = MemoryBoardStore::new();
        store.create_user(user("alice")).await.unwrap();
        let cell = CellEntity::new("alice", "x", 0);
        let id = cell.id;
        store.replace_board("alice".into(), vec![cell]).await.unwrap();

        assert!(store.toggle_cell("bob".into(), id).await.unwrap().is_none());
        let toggled = store.toggle_cell("alice".into(), id).await.unwrap().unwrap();
        assert!(toggled.checked);
        assert!(store.find_cell(id).await.unwrap().unwrap().checked);
    }

    #[tokio::test]
    async fn listings_follow_position_then_insertion_order() {
        let store = MemoryBoardStore::new();
        store.create_user(user("alice")).await.unwrap();
        let mut legacy = CellEntity::new("alice", "legacy", 0);
        legacy.position = None;
        let cells = vec![
            legacy,
            CellEntity::new("alice", "second", 1),
            CellEntity::new("alice", "first", 0),
        ];
        store.replace_board("alice".into(), cells).await.unwrap();

        let phrases = store
            .list_cells("alice".into())
            .await
            .unwrap()
            .into_iter()
            .map(|cell| cell.phrase)
            .collect::<Vec<_>>();
        assert_eq!(phrases, vec!["first", "second", "legacy"]);
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = MemoryBoardStore::new();
        store.set_online(false);
        let err = store.list_phrases().await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
        assert!(store.health_check().await.is_err());

        store.set_online(true);
        assert!(store.health_check().await.is_ok());
    }
}
