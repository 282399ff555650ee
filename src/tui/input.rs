//! Cursor movement for keyboard navigation.

use crossterm::event::KeyCode;
use strictly_wordgrid::Coord;

/// Moves the board cursor one cell for an arrow key, stopping at the edges.
pub fn move_cursor(cursor: Coord, key: KeyCode, size: usize) -> Coord {
    let last = size.saturating_sub(1);
    match key {
        KeyCode::Up => Coord::new(cursor.row.saturating_sub(1), cursor.col),
        KeyCode::Down => Coord::new((cursor.row + 1).min(last), cursor.col),
        KeyCode::Left => Coord::new(cursor.row, cursor.col.saturating_sub(1)),
        KeyCode::Right => Coord::new(cursor.row, (cursor.col + 1).min(last)),
        // No change for other keys
        _ => cursor,
    }
}
