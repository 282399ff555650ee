//! Messages exchanged with the authority.
//!
//! Push traffic in both directions uses one JSON envelope,
//! `{"event": "<name>", "data": <payload>}`. Request/response calls use plain
//! JSON bodies.

use crate::board::Board;
use crate::score::{Player, Role};
use crate::types::{Glyph, Language, PlayerId};
use derive_new::new;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ─────────────────────────────────────────────────────────────
//  Request/response bodies
// ─────────────────────────────────────────────────────────────

/// One staged letter as the validator expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct PlacedLetter {
    /// The glyph placed.
    pub letter: Glyph,
    /// Row of the cell.
    pub row: usize,
    /// Column of the cell.
    pub col: usize,
}

/// Body of the move validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    /// The staged placements in staging order.
    pub placed_letters: Vec<PlacedLetter>,
    /// Current board snapshot, staged glyphs included.
    pub board: Board,
}

/// Response of the move validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Points awarded, or the rejection sentinel.
    pub message: Verdict,
}

/// Outcome of a validation: points awarded, or rejected.
///
/// On the wire this is a number or `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The move stands and earns this many points.
    Accepted(u32),
    /// The move does not form valid words.
    Rejected,
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Verdict::Accepted(points) => serializer.serialize_u32(*points),
            Verdict::Rejected => serializer.serialize_bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VerdictVisitor;

        impl Visitor<'_> for VerdictVisitor {
            type Value = Verdict;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a point total or false")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Verdict, E> {
                // `true` carries no total; treat it as a zero-point acceptance.
                Ok(if v { Verdict::Accepted(0) } else { Verdict::Rejected })
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Verdict, E> {
                u32::try_from(v)
                    .map(Verdict::Accepted)
                    .map_err(|_| E::custom(format!("point total {v} out of range")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Verdict, E> {
                u32::try_from(v)
                    .map(Verdict::Accepted)
                    .map_err(|_| E::custom(format!("point total {v} out of range")))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Verdict, E> {
                if v.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&v) {
                    Ok(Verdict::Accepted(v as u32))
                } else {
                    Err(E::custom(format!("point total {v} is not a whole number")))
                }
            }
        }

        deserializer.deserialize_any(VerdictVisitor)
    }
}

/// Body of the replenishment call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct LettersRequest {
    /// Tiles needed to get back to a full rack.
    pub needed: usize,
}

/// Response of the replenishment call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct LettersResponse {
    /// Glyphs drawn for the player.
    pub letters: Vec<Glyph>,
}

// ─────────────────────────────────────────────────────────────
//  Push intents (client → authority)
// ─────────────────────────────────────────────────────────────

/// Fire-and-forget messages the client pushes to the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientIntent {
    /// Start a new game in the given language. Administrator only.
    NewGame {
        /// Word list to play with.
        language: Language,
    },
    /// Optimistic echo of a staged placement.
    PlaceLetter {
        /// Board including the staged glyph.
        board: Board,
    },
    /// Echo of a rollback.
    CancelMove {
        /// Board with the staged cells emptied.
        board: Board,
    },
    /// Ask the authority to credit points after an accepted move.
    UpdateScore {
        /// Player to credit.
        uid: PlayerId,
        /// Points awarded by the validator.
        score: u32,
    },
    /// Hand the turn on.
    EndTurn,
}

impl ClientIntent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ClientIntent::NewGame { .. } => "new_game",
            ClientIntent::PlaceLetter { .. } => "place_letter",
            ClientIntent::CancelMove { .. } => "cancel_move",
            ClientIntent::UpdateScore { .. } => "update_score",
            ClientIntent::EndTurn => "end_turn",
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Push events (authority → client)
// ─────────────────────────────────────────────────────────────

/// One player's entry in a letters-distributed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct RackAssignment {
    /// Player the letters belong to.
    pub uid: PlayerId,
    /// Display name, when the authority includes the roster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The player's new rack.
    pub letters: Vec<Glyph>,
    /// Current score, when the authority includes the roster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// Session privileges.
    #[serde(default)]
    pub role: Role,
}

/// One row of a score update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct RosterEntry {
    /// Player id.
    pub uid: PlayerId,
    /// Display name.
    pub name: String,
    /// Authoritative total.
    pub score: u32,
    /// Session privileges.
    #[serde(default)]
    pub role: Role,
}

impl From<RosterEntry> for Player {
    fn from(entry: RosterEntry) -> Self {
        Player::new(entry.uid, entry.name, entry.score, entry.role)
    }
}

/// Authoritative events pushed to every client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A new game began; every player receives a rack.
    #[serde(rename = "receive_letters")]
    LettersDistributed {
        /// Per-player assignments.
        players: Vec<RackAssignment>,
    },
    /// The turn moved.
    #[serde(rename = "change_turn")]
    TurnChanged {
        /// Player now holding the turn.
        turn: PlayerId,
    },
    /// Someone staged a placement.
    #[serde(rename = "placed_letter")]
    BoardPlaced {
        /// Full board snapshot.
        board: Board,
    },
    /// Someone rolled back.
    #[serde(rename = "cancel_move")]
    MoveCancelled {
        /// Full board snapshot.
        board: Board,
    },
    /// Scores changed.
    #[serde(rename = "update_score")]
    ScoreUpdated(Vec<RosterEntry>),
}

impl ServerEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::LettersDistributed { .. } => "receive_letters",
            ServerEvent::TurnChanged { .. } => "change_turn",
            ServerEvent::BoardPlaced { .. } => "placed_letter",
            ServerEvent::MoveCancelled { .. } => "cancel_move",
            ServerEvent::ScoreUpdated(_) => "update_score",
        }
    }
}
