//! Roster and running scores, a pure projection of authoritative events.

use crate::types::PlayerId;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Privileges a player holds in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular participant.
    #[default]
    Member,
    /// May start new games and choose the language.
    Administrator,
}

/// A participant as the authority reports them.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct Player {
    /// Authority-assigned id.
    id: PlayerId,
    /// Name shown on the scoreboard.
    display_name: String,
    /// Running total, only ever copied from the authority.
    score: u32,
    /// Session privileges.
    role: Role,
}

/// Ordered roster with scores.
///
/// There is no arithmetic here on purpose: every total comes from the
/// authority and replaces what was there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreBoard {
    players: Vec<Player>,
}

impl ScoreBoard {
    /// Creates an empty scoreboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roster, keeping the authority's order.
    #[instrument(skip(self, players), fields(count = players.len()))]
    pub fn apply(&mut self, players: Vec<Player>) -> bool {
        if self.players == players {
            debug!("Roster unchanged");
            return false;
        }
        self.players = players;
        true
    }

    /// Players in authority order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Looks up a player.
    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id() == id)
    }

    /// Score of a player, if on the roster.
    pub fn score_of(&self, id: &PlayerId) -> Option<u32> {
        self.get(id).map(|player| player.score)
    }

    /// Role of a player, if on the roster.
    pub fn role_of(&self, id: &PlayerId) -> Option<Role> {
        self.get(id).map(|player| player.role)
    }

    /// Returns `true` if nobody is on the roster.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
