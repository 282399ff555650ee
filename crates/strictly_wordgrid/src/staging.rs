//! Tentative placements for the turn in progress.
//!
//! Staging is optimistic: a staged tile leaves the rack and appears on the
//! board at once, and other clients see it through the placement echo.
//! [`MoveStaging::rollback`] is therefore what keeps every client
//! consistent when a move is abandoned or rejected.

use crate::board::Board;
use crate::error::{BoardError, RackError, StageError};
use crate::protocol::PlacedLetter;
use crate::rack::{Rack, Tile};
use crate::turn::TurnCoordinator;
use crate::types::{Coord, Glyph, TileId};
use derive_getters::Getters;
use derive_new::new;
use tracing::{debug, info, instrument, warn};

/// A placement recorded this turn but not yet confirmed by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct StagedPlacement {
    /// The tile taken from the rack.
    tile: Tile,
    /// Where it was put.
    coord: Coord,
}

impl StagedPlacement {
    /// Glyph on the staged tile.
    pub fn glyph(&self) -> Glyph {
        *self.tile.glyph()
    }
}

/// A requested placement: put the rack tile `tile` on `coord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct Placement {
    /// Target cell.
    pub coord: Coord,
    /// Rack tile to place.
    pub tile: TileId,
}

// ─────────────────────────────────────────────────────────────
//  Placement Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the local player holds the turn.
pub struct LocalPlayersTurn;

impl LocalPlayersTurn {
    /// Fails with [`StageError::NotYourTurn`] off turn.
    #[instrument(skip(turn))]
    pub fn check(turn: &TurnCoordinator) -> Result<(), StageError> {
        if turn.is_local_players_turn() {
            Ok(())
        } else {
            Err(StageError::NotYourTurn)
        }
    }
}

/// Precondition: the target cell exists and is empty.
pub struct CellIsEmpty;

impl CellIsEmpty {
    /// Fails with a [`BoardError`] if the cell is off the board or occupied.
    #[instrument(skip(board))]
    pub fn check(coord: Coord, board: &Board) -> Result<(), StageError> {
        if !board.contains(coord) {
            return Err(BoardError::OutOfBounds {
                coord,
                size: board.size(),
            }
            .into());
        }
        if !board.is_empty_at(coord) {
            return Err(BoardError::CellOccupied(coord).into());
        }
        Ok(())
    }
}

/// Precondition: the rack holds the tile.
pub struct TileInRack;

impl TileInRack {
    /// Fails with [`RackError::TileNotFound`] if the tile is absent.
    #[instrument(skip(rack))]
    pub fn check(tile: TileId, rack: &Rack) -> Result<(), StageError> {
        match rack.get(tile) {
            Some(_) => Ok(()),
            None => Err(RackError::TileNotFound(tile).into()),
        }
    }
}

/// Composite precondition for staging a placement.
pub struct LegalPlacement;

impl LegalPlacement {
    /// Checks turn, then cell, then tile.
    #[instrument(skip(board, rack, turn))]
    pub fn check(
        placement: &Placement,
        board: &Board,
        rack: &Rack,
        turn: &TurnCoordinator,
    ) -> Result<(), StageError> {
        LocalPlayersTurn::check(turn)?;
        CellIsEmpty::check(placement.coord, board)?;
        TileInRack::check(placement.tile, rack)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Move Staging
// ─────────────────────────────────────────────────────────────

/// Outcome of [`MoveStaging::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The snapshot with every kept staged glyph on its cell.
    pub board: Board,
    /// Staged glyphs the snapshot was missing and that were put back.
    pub reasserted: usize,
    /// Tiles returned to the rack because their cell was taken.
    pub returned: usize,
}

/// Staged placements for the turn in progress, in staging order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveStaging {
    placements: Vec<StagedPlacement>,
}

impl MoveStaging {
    /// Creates an empty staging area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a rack tile onto an empty cell.
    ///
    /// On success the tile has left the rack, a placement is recorded, and
    /// the returned board carries the glyph. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Any [`LegalPlacement`] failure.
    #[instrument(skip(self, board, rack, turn))]
    pub fn stage(
        &mut self,
        board: &Board,
        rack: &mut Rack,
        turn: &TurnCoordinator,
        placement: Placement,
    ) -> Result<Board, StageError> {
        LegalPlacement::check(&placement, board, rack, turn)?;
        let glyph = rack
            .get(placement.tile)
            .map(|tile| *tile.glyph())
            .ok_or(RackError::TileNotFound(placement.tile))?;
        let next = board.place(placement.coord, glyph)?;
        let tile = rack.remove(placement.tile)?;
        self.placements.push(StagedPlacement {
            tile,
            coord: placement.coord,
        });
        debug!(glyph = %glyph, staged = self.placements.len(), "Staged placement");
        Ok(next)
    }

    /// Abandons every staged placement.
    ///
    /// Each touched cell is emptied and each tile goes back to the rack with
    /// a fresh id. Returns the reverted board.
    #[instrument(skip(self, board, rack), fields(staged = self.placements.len()))]
    pub fn rollback(&mut self, board: &Board, rack: &mut Rack) -> Board {
        let mut next = board.clone();
        for placement in &self.placements {
            match next.clear(placement.coord) {
                Ok(cleared) => next = cleared,
                Err(e) => warn!(error = %e, "Staged cell not on board"),
            }
        }
        rack.add_tiles(self.placements.drain(..).map(|p| p.glyph()));
        info!("Rolled back staged placements");
        next
    }

    /// Accepts the staged placements as authoritative and forgets them.
    #[instrument(skip(self), fields(staged = self.placements.len()))]
    pub fn confirm(&mut self) -> Vec<StagedPlacement> {
        std::mem::take(&mut self.placements)
    }

    /// Lines the staged placements up with an authoritative snapshot.
    ///
    /// A staged cell the snapshot shows empty is an older echo of this
    /// turn; the glyph is put back on the returned board and stays staged.
    /// A staged cell the snapshot fills with another glyph was taken, so the
    /// tile goes back to the rack.
    #[instrument(skip(self, snapshot, rack))]
    pub fn reconcile(&mut self, snapshot: &Board, rack: &mut Rack) -> Reconciliation {
        let mut board = snapshot.clone();
        let mut kept = Vec::with_capacity(self.placements.len());
        let mut lost = Vec::new();
        let mut reasserted = 0;

        for placement in self.placements.drain(..) {
            match snapshot.get(placement.coord) {
                Some(glyph) if glyph == placement.glyph() => kept.push(placement),
                Some(_) => lost.push(placement),
                None => match board.place(placement.coord, placement.glyph()) {
                    Ok(next) => {
                        board = next;
                        reasserted += 1;
                        kept.push(placement);
                    }
                    Err(e) => {
                        warn!(error = %e, "Staged cell not on board");
                        lost.push(placement);
                    }
                },
            }
        }

        self.placements = kept;
        if reasserted > 0 {
            debug!(reasserted, "Snapshot predates staged placements, keeping them");
        }
        if !lost.is_empty() {
            info!(returned = lost.len(), "Staged cells taken, returning tiles");
            rack.add_tiles(lost.iter().map(StagedPlacement::glyph));
        }
        Reconciliation {
            board,
            reasserted,
            returned: lost.len(),
        }
    }

    /// Forgets staged placements without touching board or rack.
    ///
    /// Only for when the authority hands out a whole new rack.
    pub fn discard(&mut self) -> Vec<StagedPlacement> {
        std::mem::take(&mut self.placements)
    }

    /// The placements in the shape the validator expects.
    pub fn placed_letters(&self) -> Vec<PlacedLetter> {
        self.placements
            .iter()
            .map(|p| PlacedLetter::new(p.glyph(), p.coord.row, p.coord.col))
            .collect()
    }

    /// Staged placements in staging order.
    pub fn placements(&self) -> &[StagedPlacement] {
        &self.placements
    }

    /// Returns `true` if a cell holds a staged tile.
    pub fn is_staged_at(&self, coord: Coord) -> bool {
        self.placements.iter().any(|p| p.coord == coord)
    }

    /// Number of staged placements.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}
