//! The shared board: a square grid of cells, each empty or holding a glyph.
//!
//! Every mutating operation returns a new board and leaves the receiver
//! untouched. Boards travel over the wire as full row-major snapshots
//! (`Cell[][]`, with `null` for an empty cell).

use crate::error::BoardError;
use crate::types::{Coord, Glyph};
use crate::zone::{SpecialZone, ZoneTable};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, instrument};

/// Side length of the reference board.
pub const STANDARD_SIZE: usize = 20;

/// Square grid of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Glyph>>,
}

impl Board {
    /// Creates an empty board with the given side length.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Creates an empty reference-size board.
    pub fn standard() -> Self {
        Self::new(STANDARD_SIZE)
    }

    /// Builds a board from a row-major snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotSquare`] if any row length differs from the
    /// number of rows.
    #[instrument(skip(rows), fields(row_count = rows.len()))]
    pub fn from_rows(rows: Vec<Vec<Option<Glyph>>>) -> Result<Self, BoardError> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        for (row, cols) in rows.into_iter().enumerate() {
            if cols.len() != size {
                return Err(BoardError::NotSquare {
                    row,
                    len: cols.len(),
                    size,
                });
            }
            cells.extend(cols);
        }
        Ok(Self { size, cells })
    }

    /// Returns the board as row-major rows.
    pub fn rows(&self) -> Vec<Vec<Option<Glyph>>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.cells.chunks(self.size).map(<[_]>::to_vec).collect()
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the coordinate lies on the board.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.size && coord.col < self.size
    }

    /// Returns the glyph at a coordinate, `None` if empty or off the board.
    pub fn get(&self, coord: Coord) -> Option<Glyph> {
        self.index(coord).and_then(|i| self.cells[i])
    }

    /// Returns `true` if the cell exists and is empty.
    pub fn is_empty_at(&self, coord: Coord) -> bool {
        self.index(coord).is_some_and(|i| self.cells[i].is_none())
    }

    /// Returns a new board with the glyph placed at the coordinate.
    ///
    /// # Errors
    ///
    /// - [`BoardError::OutOfBounds`] if the coordinate is off the board.
    /// - [`BoardError::CellOccupied`] if the cell already holds a glyph.
    #[instrument(skip(self))]
    pub fn place(&self, coord: Coord, glyph: Glyph) -> Result<Self, BoardError> {
        let i = self.checked_index(coord)?;
        if self.cells[i].is_some() {
            debug!("Cell already occupied");
            return Err(BoardError::CellOccupied(coord));
        }
        let mut next = self.clone();
        next.cells[i] = Some(glyph);
        Ok(next)
    }

    /// Returns a new board with the cell emptied.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfBounds`] if the coordinate is off the board.
    #[instrument(skip(self))]
    pub fn clear(&self, coord: Coord) -> Result<Self, BoardError> {
        let i = self.checked_index(coord)?;
        let mut next = self.clone();
        next.cells[i] = None;
        Ok(next)
    }

    /// Iterates over occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Coord, Glyph)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, cell)| {
            cell.map(|glyph| (Coord::new(i / self.size, i % self.size), glyph))
        })
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Multiplier zone at a coordinate on the reference layout.
    pub fn zone_at(&self, coord: Coord) -> Option<SpecialZone> {
        if !self.contains(coord) {
            return None;
        }
        ZoneTable::standard().zone_at(coord)
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        self.contains(coord).then(|| coord.row * self.size + coord.col)
    }

    fn checked_index(&self, coord: Coord) -> Result<usize, BoardError> {
        self.index(coord).ok_or(BoardError::OutOfBounds {
            coord,
            size: self.size,
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<Option<Glyph>>>::deserialize(deserializer)?;
        Board::from_rows(rows).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(c: char) -> Glyph {
        Glyph::new(c)
    }

    #[test]
    fn test_place_returns_new_board() {
        let board = Board::standard();
        let placed = board.place(Coord::new(0, 0), g('A')).unwrap();
        assert_eq!(placed.get(Coord::new(0, 0)), Some(g('A')));
        assert!(board.is_empty_at(Coord::new(0, 0)), "original board must be untouched");
    }

    #[test]
    fn test_place_on_occupied_cell_fails() {
        let board = Board::standard().place(Coord::new(4, 4), g('A')).unwrap();
        let result = board.place(Coord::new(4, 4), g('B'));
        assert_eq!(result, Err(BoardError::CellOccupied(Coord::new(4, 4))));
        assert_eq!(board.get(Coord::new(4, 4)), Some(g('A')));
    }

    #[test]
    fn test_place_out_of_bounds_fails() {
        let board = Board::new(3);
        assert!(matches!(
            board.place(Coord::new(3, 0), g('A')),
            Err(BoardError::OutOfBounds { size: 3, .. })
        ));
    }

    #[test]
    fn test_clear_empties_cell() {
        let board = Board::standard().place(Coord::new(2, 3), g('Z')).unwrap();
        let cleared = board.clear(Coord::new(2, 3)).unwrap();
        assert_eq!(cleared, Board::standard());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let board = Board::new(2).place(Coord::new(0, 1), g('K')).unwrap();
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json, serde_json::json!([[null, "K"], [null, null]]));

        let back: Board = serde_json::from_value(json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn test_ragged_snapshot_rejected() {
        let json = serde_json::json!([[null, null], [null]]);
        assert!(serde_json::from_value::<Board>(json).is_err());
    }

    #[test]
    fn test_occupied_iterates_row_major() {
        let board = Board::new(3)
            .place(Coord::new(2, 0), g('C'))
            .and_then(|b| b.place(Coord::new(0, 2), g('A')))
            .unwrap();
        let cells: Vec<_> = board.occupied().collect();
        assert_eq!(cells, vec![(Coord::new(0, 2), g('A')), (Coord::new(2, 0), g('C'))]);
        assert_eq!(board.occupied_count(), 2);
    }

    #[test]
    fn test_zone_lookup_respects_bounds() {
        let board = Board::standard();
        assert_eq!(board.zone_at(Coord::new(0, 0)), Some(SpecialZone::TripleWord));
        assert_eq!(Board::new(5).zone_at(Coord::new(19, 19)), None);
    }
}
