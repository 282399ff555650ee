//! Every tile is in the rack or staged, never both.

use super::Invariant;
use crate::state::SessionState;
use std::collections::HashSet;

/// Invariant: no tile id appears twice across rack and staging.
pub struct TilesAccountedOnce;

impl Invariant<SessionState> for TilesAccountedOnce {
    fn holds(state: &SessionState) -> bool {
        let rack = state.rack().tiles().iter().map(|tile| *tile.id());
        let staged = state.staging().placements().iter().map(|p| *p.tile().id());
        let mut seen = HashSet::new();
        rack.chain(staged).all(|id| seen.insert(id))
    }

    fn description() -> &'static str {
        "Each tile is held in the rack or staged exactly once"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Role;
    use crate::types::PlayerId;

    #[test]
    fn test_holds_for_empty_session() {
        let state = SessionState::new(PlayerId::new("me"), 20, Role::Member);
        assert!(TilesAccountedOnce::holds(&state));
    }
}
