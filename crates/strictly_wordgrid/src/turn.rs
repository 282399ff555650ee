//! Turn tracking.
//!
//! The authority owns the turn order. The coordinator only mirrors the last
//! "turn changed" event and answers whether the local player may act.

use crate::types::PlayerId;
use tracing::{info, instrument};

/// Where the game is in its turn cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnPhase {
    /// No turn has been announced yet.
    #[default]
    WaitingForGameStart,
    /// The named player holds the turn.
    Turn(PlayerId),
}

/// How a turn change affected the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnShift {
    /// Same holder as before; repeated delivery.
    Unchanged,
    /// The local player now holds the turn.
    Gained,
    /// The local player held the turn and no longer does.
    Lost,
    /// The turn moved between other players.
    Passed,
}

/// Mirrors the authority's turn state for one local player.
#[derive(Debug, Clone)]
pub struct TurnCoordinator {
    local: PlayerId,
    phase: TurnPhase,
}

impl TurnCoordinator {
    /// Creates a coordinator waiting for the first turn announcement.
    pub fn new(local: PlayerId) -> Self {
        Self {
            local,
            phase: TurnPhase::WaitingForGameStart,
        }
    }

    /// The local player's id.
    pub fn local_player(&self) -> &PlayerId {
        &self.local
    }

    /// Current phase.
    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    /// The player holding the turn, if a game is running.
    pub fn current_player(&self) -> Option<&PlayerId> {
        match &self.phase {
            TurnPhase::WaitingForGameStart => None,
            TurnPhase::Turn(player) => Some(player),
        }
    }

    /// Returns `true` if the local player holds the turn.
    pub fn is_local_players_turn(&self) -> bool {
        self.current_player() == Some(&self.local)
    }

    /// Applies an authoritative turn change.
    #[instrument(skip(self), fields(local = %self.local))]
    pub fn apply_turn_changed(&mut self, player: PlayerId) -> TurnShift {
        let had_turn = self.is_local_players_turn();
        if self.current_player() == Some(&player) {
            return TurnShift::Unchanged;
        }
        let gains = player == self.local;
        info!(player = %player, "Turn changed");
        self.phase = TurnPhase::Turn(player);
        match (had_turn, gains) {
            (_, true) => TurnShift::Gained,
            (true, false) => TurnShift::Lost,
            (false, false) => TurnShift::Passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_waiting() {
        let turn = TurnCoordinator::new(PlayerId::new("me"));
        assert_eq!(turn.phase(), &TurnPhase::WaitingForGameStart);
        assert!(!turn.is_local_players_turn());
    }

    #[test]
    fn test_turn_follows_events() {
        let mut turn = TurnCoordinator::new(PlayerId::new("me"));
        assert_eq!(turn.apply_turn_changed(PlayerId::new("other")), TurnShift::Passed);
        assert!(!turn.is_local_players_turn());

        assert_eq!(turn.apply_turn_changed(PlayerId::new("me")), TurnShift::Gained);
        assert!(turn.is_local_players_turn());

        assert_eq!(turn.apply_turn_changed(PlayerId::new("me")), TurnShift::Unchanged);
        assert_eq!(turn.apply_turn_changed(PlayerId::new("third")), TurnShift::Lost);
        assert!(!turn.is_local_players_turn());
    }
}
