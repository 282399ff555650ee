//! Staged cells carry their staged glyphs.

use super::Invariant;
use crate::state::SessionState;
use std::collections::HashSet;

/// Invariant: each staged placement occupies a distinct cell holding its glyph.
pub struct StagedCellsHoldGlyphs;

impl Invariant<SessionState> for StagedCellsHoldGlyphs {
    fn holds(state: &SessionState) -> bool {
        let mut cells = HashSet::new();
        state.staging().placements().iter().all(|p| {
            cells.insert(*p.coord()) && state.board().get(*p.coord()) == Some(p.glyph())
        })
    }

    fn description() -> &'static str {
        "Staged placements occupy distinct cells holding their glyphs"
    }
}
