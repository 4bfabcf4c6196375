//! Board reads and the cell toggle operation.

use indexmap::IndexMap;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{board_store::BoardStore, models::CellEntity},
    dto::board::BoardView,
    error::ServiceError,
    services::{board_events, provisioner},
    state::{
        SharedState,
        board::{Board, BoardShapeError},
    },
};

/// Board state right after a toggle.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    /// The whole board, re-read after the write.
    pub board: Board,
    /// Win status of `board`.
    pub has_bingo: bool,
}

impl ToggleOutcome {
    /// Client projection of the toggled board.
    pub fn to_view(&self) -> BoardView {
        BoardView::new(&self.board, self.has_bingo)
    }
}

pub(crate) fn invalid_shape(username: &str, source: BoardShapeError) -> ServiceError {
    ServiceError::InvalidBoardShape {
        username: username.to_owned(),
        source,
    }
}

/// Read `username`'s cells in display order. An unknown user yields an empty board.
pub(crate) async fn load_board(
    store: &dyn BoardStore,
    username: &str,
) -> Result<Board, ServiceError> {
    let cells = store.list_cells(username.to_owned()).await?;
    Board::from_entities(username, cells).map_err(|source| invalid_shape(username, source))
}

fn view_of(board: &Board) -> Result<BoardView, ServiceError> {
    let has_bingo = board
        .has_bingo()
        .map_err(|source| invalid_shape(&board.username, source))?;
    Ok(BoardView::new(board, has_bingo))
}

/// The board of `username`, or `NotFound` when none was provisioned.
pub async fn get_board(state: &SharedState, username: &str) -> Result<BoardView, ServiceError> {
    let store = state.require_board_store().await?;
    let board = load_board(store.as_ref(), username).await?;
    if board.is_empty() {
        return Err(ServiceError::NotFound(format!("no board for `{username}`")));
    }
    view_of(&board)
}

/// Every provisioned board, in signup order, each with its cells ordered by position.
pub async fn list_boards(state: &SharedState) -> Result<Vec<BoardView>, ServiceError> {
    let store = state.require_board_store().await?;
    let cells = store.list_all_cells().await?;

    let mut by_user: IndexMap<String, Vec<CellEntity>> = IndexMap::new();
    for cell in cells {
        by_user.entry(cell.username.clone()).or_default().push(cell);
    }

    by_user
        .into_iter()
        .map(|(username, cells)| {
            let board = Board::from_entities(&username, cells)
                .map_err(|source| invalid_shape(&username, source))?;
            view_of(&board)
        })
        .collect()
}

/// Flip the `checked` flag of one of `username`'s cells and evaluate the board.
///
/// Nothing is published: viewers only learn about the change if the caller
/// broadcasts it. Request handlers use [`toggle_and_broadcast`] instead.
pub async fn toggle(
    state: &SharedState,
    username: &str,
    cell_id: Uuid,
) -> Result<ToggleOutcome, ServiceError> {
    let store = state.require_board_store().await?;
    state
        .with_board_gate(username, || toggle_cell(store.as_ref(), username, cell_id))
        .await
}

/// [`toggle`] and publish the new board while still holding the board gate,
/// so one user's updates reach viewers in the order they were applied.
pub async fn toggle_and_broadcast(
    state: &SharedState,
    username: &str,
    cell_id: Uuid,
) -> Result<BoardView, ServiceError> {
    let store = state.require_board_store().await?;
    state
        .with_board_gate(username, || async {
            let outcome = toggle_cell(store.as_ref(), username, cell_id).await?;
            let view = outcome.to_view();
            board_events::broadcast_board_updated(state.hub(), view.clone());
            Ok::<_, ServiceError>(view)
        })
        .await
}

/// Provision a fresh board for `username` and publish it.
pub async fn reset_board(state: &SharedState, username: &str) -> Result<BoardView, ServiceError> {
    let store = state.require_board_store().await?;
    state
        .with_board_gate(username, || async {
            let board = provisioner::provision_board(store.as_ref(), username).await?;
            let view = view_of(&board)?;
            board_events::broadcast_board_updated(state.hub(), view.clone());
            Ok::<_, ServiceError>(view)
        })
        .await
}

async fn toggle_cell(
    store: &dyn BoardStore,
    username: &str,
    cell_id: Uuid,
) -> Result<ToggleOutcome, ServiceError> {
    let Some(cell) = store.find_cell(cell_id).await? else {
        return Err(ServiceError::NotFound(format!("cell `{cell_id}`")));
    };
    if cell.username != username {
        return Err(ServiceError::Forbidden(format!(
            "cell `{cell_id}` belongs to another board"
        )));
    }

    // The update is filtered by owner too; a concurrent reset makes it miss.
    let Some(toggled) = store.toggle_cell(username.to_owned(), cell_id).await? else {
        return Err(ServiceError::NotFound(format!("cell `{cell_id}`")));
    };
    debug!(username, cell = %cell_id, checked = toggled.checked, "cell toggled");

    let board = load_board(store, username).await?;
    let has_bingo = board
        .has_bingo()
        .map_err(|source| invalid_shape(username, source))?;
    Ok(ToggleOutcome { board, has_bingo })
}
