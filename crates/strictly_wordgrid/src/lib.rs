//! Game logic for a shared-board word game client.
//!
//! This crate holds everything one player's client needs to keep a correct
//! view of a game whose truth lives in a remote authority: the board and its
//! multiplier zones, the local rack, optimistic staging with rollback, turn
//! tracking, the scoreboard, and the wire protocol.
//!
//! Nothing here performs I/O. Operations that must reach the authority
//! return the message to send and leave delivery to the caller.
//!
//! # Example
//!
//! ```
//! use strictly_wordgrid::{
//!     Coord, Glyph, PlayerId, RackAssignment, Role, ServerEvent, SessionState,
//! };
//!
//! let me = PlayerId::new("me");
//! let mut state = SessionState::new(me.clone(), 20, Role::Member);
//! state.apply_event(ServerEvent::LettersDistributed {
//!     players: vec![RackAssignment::new(
//!         me.clone(),
//!         None,
//!         vec![Glyph::new('A')],
//!         None,
//!         Role::Member,
//!     )],
//! });
//! state.apply_event(ServerEvent::TurnChanged { turn: me });
//!
//! let tile = *state.rack().tiles()[0].id();
//! let echo = state.stage_tile(Coord::new(9, 9), tile).unwrap();
//! assert_eq!(echo.name(), "place_letter");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod error;
pub mod invariants;
mod protocol;
mod rack;
mod score;
mod staging;
mod state;
mod turn;
mod types;
mod zone;

pub use board::{Board, STANDARD_SIZE};
pub use error::{BoardError, RackError, SessionError, StageError};
pub use invariants::{Invariant, InvariantSet, InvariantViolation, SessionInvariants};
pub use protocol::{
    ClientIntent, LettersRequest, LettersResponse, PlacedLetter, RackAssignment, RosterEntry,
    ServerEvent, ValidationRequest, ValidationResponse, Verdict,
};
pub use rack::{RACK_CAPACITY, Rack, Tile};
pub use score::{Player, Role, ScoreBoard};
pub use staging::{
    CellIsEmpty, LegalPlacement, LocalPlayersTurn, MoveStaging, Placement, Reconciliation,
    StagedPlacement, TileInRack,
};
pub use state::{CommitOutcome, EndTurnPlan, SessionState};
pub use turn::{TurnCoordinator, TurnPhase, TurnShift};
pub use types::{Coord, Glyph, GlyphParseError, Language, PlayerId, TileId};
pub use zone::{SpecialZone, ZoneTable};
