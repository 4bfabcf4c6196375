//! Board projections exchanged with HTTP and live update clients.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::board::{Board, Cell};

/// One cell as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CellDto {
    /// Identifier to send back when toggling.
    pub id: Uuid,
    /// Phrase printed on the cell.
    pub phrase: String,
    /// Whether the cell is marked.
    pub checked: bool,
    /// Grid position, row-major from the top-left corner.
    pub position: u8,
}

impl From<&Cell> for CellDto {
    fn from(cell: &Cell) -> Self {
        Self {
            id: cell.id,
            phrase: cell.phrase.clone(),
            checked: cell.checked,
            position: cell.position,
        }
    }
}

/// A user's board with its cells in position order and the current win status.
///
/// This is also the payload of every `updateBoard` live message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    /// Owner of the board.
    pub username: String,
    /// The 25 cells ordered by position.
    pub bingo_items: Vec<CellDto>,
    /// True when a row, column or diagonal is fully marked.
    pub has_bingo: bool,
}

impl BoardView {
    /// Project a domain board whose win status was already evaluated.
    pub fn new(board: &Board, has_bingo: bool) -> Self {
        Self {
            username: board.username.clone(),
            bingo_items: board.cells.iter().map(CellDto::from).collect(),
            has_bingo,
        }
    }
}

/// Page data for `GET /bingo`: every board plus the viewer's username.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardsResponse {
    /// Username of the logged-in caller.
    pub viewer: String,
    /// Every provisioned board in signup order.
    pub boards: Vec<BoardView>,
}

/// Body of `POST /bingo/toggle`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleRequest {
    /// Cell to flip; it must belong to the caller.
    pub id: Uuid,
}

/// JSON answer to a toggle.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    /// Always `true`; failures use the error body instead.
    pub success: bool,
    /// The caller's cells after the toggle.
    pub bingo_items: Vec<CellDto>,
    /// Win status after the toggle.
    pub has_bingo: bool,
    /// Owner of the toggled board.
    pub username: String,
}

impl From<BoardView> for ToggleResponse {
    fn from(view: BoardView) -> Self {
        Self {
            success: true,
            bingo_items: view.bingo_items,
            has_bingo: view.has_bingo,
            username: view.username,
        }
    }
}
