//! Board domain model and the win detector.
//!
//! A board is 25 cells laid out row-major on a 5×5 grid: the cell at
//! `position` lives at row `position / 5` and column `position % 5`.

use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::CellEntity;

/// Number of cells on each side of the grid.
pub const BOARD_SIDE: usize = 5;
/// Number of cells on a complete board.
pub const BOARD_CELLS: usize = BOARD_SIDE * BOARD_SIDE;

/// One grid square.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Stable cell identity.
    pub id: Uuid,
    /// Phrase drawn from the pool.
    pub phrase: String,
    /// Marked by the owner.
    pub checked: bool,
    /// Row-major index in `0..25`.
    pub position: u8,
}

impl Cell {
    fn row(&self) -> usize {
        self.position as usize / BOARD_SIDE
    }

    fn column(&self) -> usize {
        self.position as usize % BOARD_SIDE
    }
}

/// A user's board, cells ordered by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Owner.
    pub username: String,
    /// Cells in position order.
    pub cells: Vec<Cell>,
}

/// Violations of the 25-cell / clean permutation invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardShapeError {
    /// Not exactly 25 cells.
    #[error("board has {actual} cells, expected {expected}")]
    CellCount {
        /// Always [`BOARD_CELLS`].
        expected: usize,
        /// Cells found.
        actual: usize,
    },
    /// A position past the last grid square.
    #[error("cell position {position} is outside 0..{BOARD_CELLS}")]
    PositionOutOfRange {
        /// Offending position.
        position: u8,
    },
    /// Two cells share a square.
    #[error("cell position {position} appears more than once")]
    DuplicatePosition {
        /// Shared position.
        position: u8,
    },
    /// Legacy unpositioned rows mixed with positioned ones.
    #[error("board mixes positioned and unpositioned cells")]
    MixedPositions,
}

impl Board {
    /// Build a board from storage rows.
    ///
    /// Rows are expected in display order (position first, insertion order as the
    /// tie breaker). Legacy boards persisted without any position get positions
    /// derived from that order; a board mixing both kinds is rejected. The result
    /// is not shape-checked beyond that, see [`Board::validate`].
    pub fn from_entities(
        username: impl Into<String>,
        entities: Vec<CellEntity>,
    ) -> Result<Self, BoardShapeError> {
        let positioned = entities.iter().filter(|e| e.position.is_some()).count();
        let legacy = positioned == 0 && !entities.is_empty();
        if !legacy && positioned != entities.len() {
            return Err(BoardShapeError::MixedPositions);
        }

        let mut cells = entities
            .into_iter()
            .enumerate()
            .map(|(index, entity)| {
                let position = match entity.position {
                    Some(position) => position,
                    None => u8::try_from(index)
                        .map_err(|_| BoardShapeError::PositionOutOfRange { position: u8::MAX })?,
                };
                Ok(Cell {
                    id: entity.id,
                    phrase: entity.phrase,
                    checked: entity.checked,
                    position,
                })
            })
            .collect::<Result<Vec<_>, BoardShapeError>>()?;
        cells.sort_by_key(|cell| cell.position);

        Ok(Self {
            username: username.into(),
            cells,
        })
    }

    /// True when the user has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check the shape invariant without evaluating the grid.
    pub fn validate(&self) -> Result<(), BoardShapeError> {
        build_grid(&self.cells).map(|_| ())
    }

    /// Evaluate the board with the win detector.
    pub fn has_bingo(&self) -> Result<bool, BoardShapeError> {
        has_bingo(&self.cells)
    }

    /// Look up a cell by its identity.
    pub fn cell(&self, id: Uuid) -> Option<&Cell> {
        self.cells.iter().find(|cell| cell.id == id)
    }
}

/// Report whether any row, column or diagonal of the board is fully checked.
///
/// Fails when `cells` is not exactly 25 cells whose positions are a permutation
/// of `0..25`.
pub fn has_bingo(cells: &[Cell]) -> Result<bool, BoardShapeError> {
    let grid = build_grid(cells)?;
    Ok(winning_lines().any(|line| line.iter().all(|&(r, c)| grid[r][c])))
}

/// Grid coordinates `(row, column)` of one winning line.
pub type Line = [(usize, usize); BOARD_SIDE];

/// The 12 lines that win: 5 rows, 5 columns, then both diagonals.
pub fn winning_lines() -> impl Iterator<Item = Line> {
    let rows = (0..BOARD_SIDE).map(|r| -> Line { std::array::from_fn(|c| (r, c)) });
    let columns = (0..BOARD_SIDE).map(|c| -> Line { std::array::from_fn(|r| (r, c)) });
    let main_diagonal: Line = std::array::from_fn(|i| (i, i));
    let anti_diagonal: Line = std::array::from_fn(|i| (i, BOARD_SIDE - 1 - i));
    rows.chain(columns).chain([main_diagonal, anti_diagonal])
}

fn build_grid(cells: &[Cell]) -> Result<[[bool; BOARD_SIDE]; BOARD_SIDE], BoardShapeError> {
    if cells.len() != BOARD_CELLS {
        return Err(BoardShapeError::CellCount {
            expected: BOARD_CELLS,
            actual: cells.len(),
        });
    }

    let mut seen = [false; BOARD_CELLS];
    let mut grid = [[false; BOARD_SIDE]; BOARD_SIDE];
    for cell in cells {
        let index = cell.position as usize;
        if index >= BOARD_CELLS {
            return Err(BoardShapeError::PositionOutOfRange {
                position: cell.position,
            });
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(BoardShapeError::DuplicatePosition {
                position: cell.position,
            });
        }
        grid[cell.row()][cell.column()] = cell.checked;
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(checked: impl Fn(u8) -> bool) -> Vec<Cell> {
        (0..BOARD_CELLS as u8)
            .map(|position| Cell {
                id: Uuid::new_v4(),
                phrase: format!("phrase {position}"),
                checked: checked(position),
                position,
            })
            .collect()
    }

    fn positions_of(line: Line) -> Vec<u8> {
        line.iter()
            .map(|&(r, c)| (r * BOARD_SIDE + c) as u8)
            .collect()
    }

    #[test]
    fn there_are_twelve_winning_lines() {
        assert_eq!(winning_lines().count(), 12);
    }

    #[test]
    fn empty_board_has_no_bingo() {
        let cells = board_with(|_| false);
        assert_eq!(has_bingo(&cells), Ok(false));
    }

    #[test]
    fn every_winning_line_is_detected() {
        for line in winning_lines() {
            let positions = positions_of(line);
            let cells = board_with(|p| positions.contains(&p));
            assert_eq!(has_bingo(&cells), Ok(true), "line {positions:?}");
        }
    }

    #[test]
    fn line_missing_one_cell_is_not_bingo() {
        for line in winning_lines() {
            let positions = positions_of(line);
            for hole in &positions {
                let cells = board_with(|p| positions.contains(&p) && p != *hole);
                assert_eq!(has_bingo(&cells), Ok(false), "line {positions:?} hole {hole}");
            }
        }
    }

    #[test]
    fn checkerboard_pattern_wins_on_diagonals_only() {
        // Positions where row + column is even: both diagonals are fully covered.
        let cells = board_with(|p| (p as usize / BOARD_SIDE + p as usize % BOARD_SIDE) % 2 == 0);
        assert_eq!(has_bingo(&cells), Ok(true));

        // Odd squares never complete a line.
        let cells = board_with(|p| (p as usize / BOARD_SIDE + p as usize % BOARD_SIDE) % 2 == 1);
        assert_eq!(has_bingo(&cells), Ok(false));
    }

    #[test]
    fn one_hole_per_row_and_column_off_the_diagonals_is_not_bingo() {
        let holes = [0u8, 7, 14, 16, 23];
        let cells = board_with(|p| !holes.contains(&p));
        assert_eq!(has_bingo(&cells), Ok(false));
    }

    #[test]
    fn single_hole_still_leaves_complete_rows() {
        let cells = board_with(|p| p != 12);
        assert_eq!(has_bingo(&cells), Ok(true));
    }

    #[test]
    fn order_of_cells_does_not_matter() {
        let mut cells = board_with(|p| p % 5 == 3);
        cells.reverse();
        assert_eq!(has_bingo(&cells), Ok(true));
    }

    #[test]
    fn wrong_cell_count_is_rejected() {
        let mut cells = board_with(|_| true);
        cells.pop();
        assert_eq!(
            has_bingo(&cells),
            Err(BoardShapeError::CellCount {
                expected: 25,
                actual: 24
            })
        );
        assert!(matches!(
            has_bingo(&[]),
            Err(BoardShapeError::CellCount { actual: 0, .. })
        ));
    }

    #[test]
    fn duplicate_and_out_of_range_positions_are_rejected() {
        let mut cells = board_with(|_| false);
        cells[24].position = 3;
        assert_eq!(
            has_bingo(&cells),
            Err(BoardShapeError::DuplicatePosition { position: 3 })
        );

        let mut cells = board_with(|_| false);
        cells[24].position = 25;
        assert_eq!(
            has_bingo(&cells),
            Err(BoardShapeError::PositionOutOfRange { position: 25 })
        );
    }

    #[test]
    fn legacy_rows_get_positions_from_identity_order() {
        let entities = (0..BOARD_CELLS)
            .map(|index| CellEntity {
                id: Uuid::new_v4(),
                username: "alice".into(),
                phrase: format!("phrase {index}"),
                checked: index < BOARD_SIDE,
                position: None,
            })
            .collect::<Vec<_>>();

        let board = Board::from_entities("alice", entities).unwrap();
        assert_eq!(board.cells[7].position, 7);
        assert_eq!(board.cells[7].phrase, "phrase 7");
        assert_eq!(board.has_bingo(), Ok(true));
    }

    #[test]
    fn mixed_positions_are_rejected() {
        let entities = vec![
            CellEntity {
                id: Uuid::new_v4(),
                username: "alice".into(),
                phrase: "a".into(),
                checked: false,
                position: Some(0),
            },
            CellEntity {
                id: Uuid::new_v4(),
                username: "alice".into(),
                phrase: "b".into(),
                checked: false,
                position: None,
            },
        ];
        assert_eq!(
            Board::from_entities("alice", entities),
            Err(BoardShapeError::MixedPositions)
        );
    }
}
