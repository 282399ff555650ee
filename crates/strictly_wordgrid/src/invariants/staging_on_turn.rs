//! Staging is empty outside the local player's turn.

use super::Invariant;
use crate::state::SessionState;

/// Invariant: placements are only staged while the local player holds the turn.
pub struct StagingOnlyOnTurn;

impl Invariant<SessionState> for StagingOnlyOnTurn {
    fn holds(state: &SessionState) -> bool {
        state.staging().is_empty() || state.is_local_players_turn()
    }

    fn description() -> &'static str {
        "Staged placements exist only during the local player's turn"
    }
}
