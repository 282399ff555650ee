//! Error types for board, rack, staging and session operations.

use crate::types::{Coord, TileId};

/// Error from a board operation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum BoardError {
    /// The target cell already holds a glyph.
    #[display("Cell {} is already occupied", _0)]
    CellOccupied(Coord),

    /// The coordinate lies outside the board.
    #[display("Cell {coord} is outside the {size}x{size} board")]
    OutOfBounds {
        /// Requested cell.
        coord: Coord,
        /// Board side length.
        size: usize,
    },

    /// A snapshot row does not match the board side length.
    #[display("Board snapshot row {row} has {len} cells, expected {size}")]
    NotSquare {
        /// Offending row index.
        row: usize,
        /// Cells found in that row.
        len: usize,
        /// Expected side length.
        size: usize,
    },
}

impl std::error::Error for BoardError {}

/// Error from a rack operation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RackError {
    /// No tile with this id is in the rack.
    #[display("Tile {} is not in the rack", _0)]
    TileNotFound(TileId),
}

impl std::error::Error for RackError {}

/// Error from staging a placement.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum StageError {
    /// The local player does not hold the turn.
    #[display("It's not your turn")]
    NotYourTurn,

    /// No tile is selected for placement.
    #[display("No tile selected")]
    NoTileSelected,

    /// The board refused the placement.
    #[display("{}", _0)]
    Board(BoardError),

    /// The rack does not hold the tile.
    #[display("{}", _0)]
    Rack(RackError),
}

impl std::error::Error for StageError {}

impl From<BoardError> for StageError {
    fn from(err: BoardError) -> Self {
        Self::Board(err)
    }
}

impl From<RackError> for StageError {
    fn from(err: RackError) -> Self {
        Self::Rack(err)
    }
}

/// Error from a session-level intent.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// The local player does not hold the turn.
    #[display("It's not your turn")]
    NotYourTurn,

    /// Commit requested with nothing staged.
    #[display("Nothing to commit")]
    NothingStaged,

    /// Only the administrator may start games or choose the language.
    #[display("Only the administrator can do that")]
    NotAdministrator,

    /// Staging failed.
    #[display("{}", _0)]
    Stage(StageError),
}

impl std::error::Error for SessionError {}

impl From<StageError> for SessionError {
    fn from(err: StageError) -> Self {
        Self::Stage(err)
    }
}
