//! The local player's rack of tiles.

use crate::error::RackError;
use crate::turn::TurnCoordinator;
use crate::types::{Glyph, TileId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Number of tiles the authority tops the rack up to after each turn.
pub const RACK_CAPACITY: usize = 7;

/// A tile held by the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct Tile {
    /// Letter on the tile.
    glyph: Glyph,
    /// Local identity, never reused within a session.
    id: TileId,
}

/// Ordered tiles the local player holds and has not placed this turn.
///
/// Ids are issued from a monotonic counter so that a selection made before
/// a rack change can never silently point at a different tile.
#[derive(Debug, Clone, Default)]
pub struct Rack {
    tiles: Vec<Tile>,
    next_id: u64,
    selected: Option<TileId>,
}

impl Rack {
    /// Creates an empty rack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends tiles, assigning each a fresh id.
    #[instrument(skip(self, glyphs))]
    pub fn add_tiles(&mut self, glyphs: impl IntoIterator<Item = Glyph>) -> Vec<TileId> {
        let ids: Vec<TileId> = glyphs
            .into_iter()
            .map(|glyph| {
                let id = self.issue_id();
                self.tiles.push(Tile { glyph, id });
                id
            })
            .collect();
        debug!(added = ids.len(), size = self.tiles.len(), "Added tiles to rack");
        ids
    }

    /// Replaces the whole rack. The selection is dropped.
    #[instrument(skip(self, glyphs))]
    pub fn replace_all(&mut self, glyphs: impl IntoIterator<Item = Glyph>) {
        self.tiles.clear();
        self.selected = None;
        self.add_tiles(glyphs);
    }

    /// Removes exactly one tile by id.
    ///
    /// # Errors
    ///
    /// Returns [`RackError::TileNotFound`] if the rack holds no such tile.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: TileId) -> Result<Tile, RackError> {
        let index = self
            .tiles
            .iter()
            .position(|tile| tile.id == id)
            .ok_or(RackError::TileNotFound(id))?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(self.tiles.remove(index))
    }

    /// Selects a tile for the next placement.
    ///
    /// Outside the local player's turn, or for an unknown id, this is a
    /// no-op and returns `false`.
    #[instrument(skip(self, turn))]
    pub fn select(&mut self, id: TileId, turn: &TurnCoordinator) -> bool {
        if !turn.is_local_players_turn() {
            debug!("Ignoring selection outside own turn");
            return false;
        }
        if self.get(id).is_none() {
            debug!("Ignoring selection of unknown tile");
            return false;
        }
        self.selected = Some(id);
        true
    }

    /// Clears the selection. A no-op outside the local player's turn.
    pub fn clear_selection(&mut self, turn: &TurnCoordinator) -> bool {
        if !turn.is_local_players_turn() {
            return false;
        }
        self.selected = None;
        true
    }

    /// Drops the selection unconditionally, used when the turn moves on.
    pub(crate) fn reset_selection(&mut self) {
        self.selected = None;
    }

    /// Currently selected tile id.
    pub fn selected(&self) -> Option<TileId> {
        self.selected
    }

    /// Looks up a tile by id.
    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }

    /// Looks up a tile by its 1-based position, as shown to the player.
    pub fn nth(&self, position: usize) -> Option<&Tile> {
        position.checked_sub(1).and_then(|i| self.tiles.get(i))
    }

    /// Tiles in rack order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Glyphs in rack order.
    pub fn glyphs(&self) -> Vec<Glyph> {
        self.tiles.iter().map(|tile| tile.glyph).collect()
    }

    /// Number of tiles held.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns `true` if no tiles are held.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles needed to get back to [`RACK_CAPACITY`].
    pub fn needed(&self) -> usize {
        RACK_CAPACITY.saturating_sub(self.tiles.len())
    }

    fn issue_id(&mut self) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        id
    }
}
