//! Board provisioning: sampling fresh boards out of the shared phrase pool.

use rand::{Rng, seq::SliceRandom};
use tracing::{info, warn};

use crate::{
    dao::{board_store::BoardStore, models::CellEntity, storage::StorageResult},
    error::ServiceError,
    services::board_service::{invalid_shape, load_board},
    state::{
        SharedState,
        board::{BOARD_CELLS, Board},
    },
};

/// Draw 25 distinct phrases from `pool` in random order and lay them out on positions `0..25`.
pub fn sample_cells<R: Rng + ?Sized>(
    username: &str,
    pool: &[String],
    rng: &mut R,
) -> Result<Vec<CellEntity>, ServiceError> {
    if pool.len() < BOARD_CELLS {
        return Err(ServiceError::PoolExhausted {
            available: pool.len(),
            required: BOARD_CELLS,
        });
    }

    let mut phrases = pool.to_vec();
    phrases.shuffle(rng);
    Ok(phrases
        .into_iter()
        .take(BOARD_CELLS)
        .zip(0u8..)
        .map(|(phrase, position)| CellEntity::new(username, phrase, position))
        .collect())
}

/// Replace `username`'s board with a freshly sampled one.
///
/// Destructive: every cell of the previous board is dropped in the same storage
/// transaction that inserts the new ones.
pub async fn provision(state: &SharedState, username: &str) -> Result<Board, ServiceError> {
    let store = state.require_board_store().await?;
    state
        .with_board_gate(username, || provision_board(store.as_ref(), username))
        .await
}

/// Return the user's board, provisioning one only when they have no cells yet.
pub async fn ensure(state: &SharedState, username: &str) -> Result<Board, ServiceError> {
    let store = state.require_board_store().await?;
    state
        .with_board_gate(username, || async {
            let board = load_board(store.as_ref(), username).await?;
            if board.is_empty() {
                return provision_board(store.as_ref(), username).await;
            }
            board
                .validate()
                .map_err(|source| invalid_shape(username, source))?;
            Ok::<_, ServiceError>(board)
        })
        .await
}

/// Ungated provisioning; callers hold the board gate of `username`.
pub(crate) async fn provision_board(
    store: &dyn BoardStore,
    username: &str,
) -> Result<Board, ServiceError> {
    let pool = store.list_phrases().await?;
    let cells = sample_cells(username, &pool, &mut rand::rng())?;
    store.replace_board(username.to_owned(), cells).await?;

    let board = load_board(store, username).await?;
    board
        .validate()
        .map_err(|source| invalid_shape(username, source))?;
    info!(username, pool = pool.len(), "provisioned board");
    Ok(board)
}

/// Seed the configured phrase catalog when the pool is still empty.
pub async fn seed_phrase_pool(store: &dyn BoardStore, phrases: &[String]) -> StorageResult<usize> {
    let size = store.seed_phrases(phrases.to_vec()).await?;
    if size < BOARD_CELLS {
        warn!(size, required = BOARD_CELLS, "phrase pool too small to build boards");
    } else {
        info!(size, "phrase pool ready");
    }
    Ok(size)
}
