//! The per-session aggregate: board, rack, staging, turn and roster.
//!
//! [`SessionState`] is synchronous and does no I/O. Every operation that
//! must reach the authority returns the message to send; the caller owns
//! delivery. Inbound events are applied with [`SessionState::apply_event`],
//! which is idempotent against repeated delivery.

use crate::board::Board;
use crate::error::{SessionError, StageError};
use crate::invariants::assert_invariants;
use crate::protocol::{
    ClientIntent, LettersRequest, PlacedLetter, RackAssignment, ServerEvent, ValidationRequest,
    Verdict,
};
use crate::rack::Rack;
use crate::score::{Player, Role, ScoreBoard};
use crate::staging::{LocalPlayersTurn, MoveStaging, Placement};
use crate::turn::{TurnCoordinator, TurnShift};
use crate::types::{Coord, Glyph, Language, PlayerId, TileId};
use tracing::{debug, info, instrument, warn};

/// What became of a commit once the validator answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The move stands. The caller should send `score_request`.
    Accepted {
        /// Points awarded.
        points: u32,
        /// Asks the authority to credit the points.
        score_request: ClientIntent,
    },
    /// The move was refused and rolled back. The caller should send `cancel_echo`.
    Rejected {
        /// Echo of the reverted board.
        cancel_echo: ClientIntent,
    },
    /// Staging changed while the request was in flight; nothing was
    /// confirmed and nothing is sent.
    Stale,
}

/// First half of ending a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTurnPlan {
    /// Echo of a rollback, if tiles were still staged.
    pub cancel_echo: Option<ClientIntent>,
    /// Replenishment request to send to the authority.
    pub request: LettersRequest,
}

/// One player's view of a running game.
#[derive(Debug, Clone)]
pub struct SessionState {
    board: Board,
    rack: Rack,
    staging: MoveStaging,
    turn: TurnCoordinator,
    scores: ScoreBoard,
    language: Language,
    initial_role: Role,
    in_flight: Option<Vec<PlacedLetter>>,
}

impl SessionState {
    /// Creates the state for a freshly entered game view.
    pub fn new(local: PlayerId, board_size: usize, initial_role: Role) -> Self {
        Self {
            board: Board::new(board_size),
            rack: Rack::new(),
            staging: MoveStaging::new(),
            turn: TurnCoordinator::new(local),
            scores: ScoreBoard::new(),
            language: Language::default(),
            initial_role,
            in_flight: None,
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Queries
    // ─────────────────────────────────────────────────────────────

    /// Current board, staged glyphs included.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Local rack.
    pub fn rack(&self) -> &Rack {
        &self.rack
    }

    /// Staged placements.
    pub fn staging(&self) -> &MoveStaging {
        &self.staging
    }

    /// Turn state.
    pub fn turn(&self) -> &TurnCoordinator {
        &self.turn
    }

    /// Roster and scores.
    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    /// Language the next game will be started in.
    pub fn language(&self) -> Language {
        self.language
    }

    /// The local player's id.
    pub fn local_player(&self) -> &PlayerId {
        self.turn.local_player()
    }

    /// Returns `true` if the local player holds the turn.
    pub fn is_local_players_turn(&self) -> bool {
        self.turn.is_local_players_turn()
    }

    /// The local player's role: from the roster once known, else the initial one.
    pub fn role(&self) -> Role {
        self.scores
            .role_of(self.turn.local_player())
            .unwrap_or(self.initial_role)
    }

    /// Returns `true` if the local player may start games.
    pub fn is_administrator(&self) -> bool {
        self.role() == Role::Administrator
    }

    // ─────────────────────────────────────────────────────────────
    //  Local intents
    // ─────────────────────────────────────────────────────────────

    /// Selects a rack tile. A no-op off turn.
    pub fn select_tile(&mut self, id: TileId) -> bool {
        self.rack.select(id, &self.turn)
    }

    /// Clears the selection. A no-op off turn.
    pub fn clear_selection(&mut self) -> bool {
        self.rack.clear_selection(&self.turn)
    }

    /// Stages the selected tile onto a cell.
    ///
    /// # Errors
    ///
    /// [`StageError::NotYourTurn`] off turn, [`StageError::NoTileSelected`]
    /// without a selection, otherwise as [`SessionState::stage_tile`].
    pub fn stage_selected(&mut self, coord: Coord) -> Result<ClientIntent, StageError> {
        LocalPlayersTurn::check(&self.turn)?;
        let tile = self.rack.selected().ok_or(StageError::NoTileSelected)?;
        self.stage_tile(coord, tile)
    }

    /// Stages a rack tile onto a cell and returns the placement echo.
    ///
    /// Nothing changes on failure; in particular nothing is sent.
    ///
    /// # Errors
    ///
    /// Any placement precondition failure.
    #[instrument(skip(self), fields(player = %self.local_player()))]
    pub fn stage_tile(&mut self, coord: Coord, tile: TileId) -> Result<ClientIntent, StageError> {
        let board = self.staging.stage(
            &self.board,
            &mut self.rack,
            &self.turn,
            Placement::new(coord, tile),
        )?;
        self.board = board;
        self.rack.reset_selection();
        assert_invariants(self);
        Ok(ClientIntent::PlaceLetter {
            board: self.board.clone(),
        })
    }

    /// Rolls back every staged placement and returns the cancel echo.
    ///
    /// Returns `None` off turn or with nothing staged.
    #[instrument(skip(self), fields(player = %self.local_player()))]
    pub fn cancel(&mut self) -> Option<ClientIntent> {
        if !self.turn.is_local_players_turn() || self.staging.is_empty() {
            debug!("Nothing to cancel");
            return None;
        }
        Some(self.rollback())
    }

    /// Chooses the language for the next game. Administrator only.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAdministrator`] for everyone else.
    pub fn set_language(&mut self, language: Language) -> Result<(), SessionError> {
        if !self.is_administrator() {
            return Err(SessionError::NotAdministrator);
        }
        self.language = language;
        Ok(())
    }

    /// Builds the new-game intent. Administrator only.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAdministrator`] for everyone else.
    #[instrument(skip(self), fields(player = %self.local_player()))]
    pub fn request_new_game(&self) -> Result<ClientIntent, SessionError> {
        if !self.is_administrator() {
            warn!("New game refused: not administrator");
            return Err(SessionError::NotAdministrator);
        }
        info!(language = %self.language, "Requesting new game");
        Ok(ClientIntent::NewGame {
            language: self.language,
        })
    }

    /// Builds the validation request for the staged move and remembers
    /// which placements it covers.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotYourTurn`] off turn, [`SessionError::NothingStaged`]
    /// with nothing staged.
    #[instrument(skip(self), fields(player = %self.local_player()))]
    pub fn begin_commit(&mut self) -> Result<ValidationRequest, SessionError> {
        if !self.turn.is_local_players_turn() {
            return Err(SessionError::NotYourTurn);
        }
        if self.staging.is_empty() {
            return Err(SessionError::NothingStaged);
        }
        let placed = self.staging.placed_letters();
        self.in_flight = Some(placed.clone());
        Ok(ValidationRequest::new(placed, self.board.clone()))
    }

    /// Applies the validator's verdict to the staged move.
    ///
    /// The verdict only counts for the exact placements sent by
    /// [`SessionState::begin_commit`]; if staging has changed since, the
    /// outcome is [`CommitOutcome::Stale`] and the move stays staged.
    #[instrument(skip(self), fields(player = %self.local_player()))]
    pub fn resolve_commit(&mut self, verdict: Verdict) -> CommitOutcome {
        let Some(submitted) = self.in_flight.take() else {
            debug!("Verdict arrived with no commit in flight");
            return CommitOutcome::Stale;
        };
        if self.staging.is_empty() {
            debug!("Verdict arrived after staging was cleared");
            return CommitOutcome::Stale;
        }
        if submitted != self.staging.placed_letters() {
            info!(
                submitted = submitted.len(),
                staged = self.staging.len(),
                "Staging changed while validating, dropping verdict"
            );
            return CommitOutcome::Stale;
        }
        match verdict {
            Verdict::Accepted(points) => {
                let confirmed = self.staging.confirm();
                info!(points, tiles = confirmed.len(), "Move accepted");
                assert_invariants(self);
                CommitOutcome::Accepted {
                    points,
                    score_request: ClientIntent::UpdateScore {
                        uid: self.local_player().clone(),
                        score: points,
                    },
                }
            }
            Verdict::Rejected => {
                info!("Move rejected");
                CommitOutcome::Rejected {
                    cancel_echo: self.rollback(),
                }
            }
        }
    }

    /// Starts ending the turn: rolls back anything still staged and sizes
    /// the replenishment request.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotYourTurn`] off turn.
    #[instrument(skip(self), fields(player = %self.local_player()))]
    pub fn begin_end_turn(&mut self) -> Result<EndTurnPlan, SessionError> {
        if !self.turn.is_local_players_turn() {
            return Err(SessionError::NotYourTurn);
        }
        let cancel_echo = (!self.staging.is_empty()).then(|| self.rollback());
        let needed = self.rack.needed();
        debug!(needed, "Ending turn");
        Ok(EndTurnPlan {
            cancel_echo,
            request: LettersRequest::new(needed),
        })
    }

    /// Adds the replenishment tiles and returns the end-turn intent.
    ///
    /// If the turn moved on while the request was in flight, the tiles are
    /// still added but no end-turn is sent.
    #[instrument(skip(self, letters), fields(count = letters.len()))]
    pub fn complete_end_turn(&mut self, letters: Vec<Glyph>) -> Option<ClientIntent> {
        let needed = self.rack.needed();
        if letters.len() > needed {
            warn!(needed, received = letters.len(), "Authority sent more tiles than needed");
        }
        self.rack.add_tiles(letters);
        if !self.turn.is_local_players_turn() {
            debug!("Turn already moved on, not sending end_turn");
            return None;
        }
        Some(ClientIntent::EndTurn)
    }

    // ─────────────────────────────────────────────────────────────
    //  Inbound events
    // ─────────────────────────────────────────────────────────────

    /// Applies an authoritative event.
    ///
    /// Returns an echo to send when the event changed staged cells: a
    /// cancel when they were cleared, a placement when an older snapshot
    /// was missing some of them.
    #[instrument(skip(self, event), fields(event = event.name()))]
    pub fn apply_event(&mut self, event: ServerEvent) -> Option<ClientIntent> {
        let echo = match event {
            ServerEvent::LettersDistributed { players } => self.apply_letters(players),
            ServerEvent::TurnChanged { turn } => self.apply_turn(turn),
            ServerEvent::BoardPlaced { board } | ServerEvent::MoveCancelled { board } => {
                self.apply_board(board)
            }
            ServerEvent::ScoreUpdated(entries) => {
                self.scores
                    .apply(entries.into_iter().map(Player::from).collect());
                None
            }
        };
        assert_invariants(self);
        echo
    }

    fn apply_letters(&mut self, players: Vec<RackAssignment>) -> Option<ClientIntent> {
        if players.iter().all(|p| p.name.is_some()) {
            let roster = players
                .iter()
                .map(|p| {
                    Player::new(
                        p.uid.clone(),
                        p.name.clone().unwrap_or_default(),
                        p.score.unwrap_or(0),
                        p.role,
                    )
                })
                .collect();
            self.scores.apply(roster);
        }

        let local = self.turn.local_player();
        let Some(assignment) = players.into_iter().find(|p| &p.uid == local) else {
            debug!("No letters for the local player");
            return None;
        };
        if self.staging.is_empty() && self.rack.glyphs() == assignment.letters {
            debug!("Rack already matches");
            return None;
        }
        let discarded = self.staging.discard();
        for placement in &discarded {
            match self.board.clear(*placement.coord()) {
                Ok(board) => self.board = board,
                Err(e) => warn!(error = %e, "Staged cell not on board"),
            }
        }
        self.in_flight = None;
        info!(tiles = assignment.letters.len(), "Received new rack");
        self.rack.replace_all(assignment.letters);
        if discarded.is_empty() {
            return None;
        }
        info!(cleared = discarded.len(), "New rack cleared staged cells");
        Some(ClientIntent::CancelMove {
            board: self.board.clone(),
        })
    }

    fn apply_turn(&mut self, player: PlayerId) -> Option<ClientIntent> {
        let shift = self.turn.apply_turn_changed(player);
        if shift == TurnShift::Unchanged {
            return None;
        }
        self.rack.reset_selection();
        if shift == TurnShift::Lost && !self.staging.is_empty() {
            warn!(staged = self.staging.len(), "Turn lost with tiles staged, rolling back");
            return Some(self.rollback());
        }
        None
    }

    fn apply_board(&mut self, snapshot: Board) -> Option<ClientIntent> {
        if snapshot == self.board {
            debug!("Board unchanged");
            return None;
        }
        let outcome = self.staging.reconcile(&snapshot, &mut self.rack);
        self.board = outcome.board;
        (outcome.reasserted > 0).then(|| ClientIntent::PlaceLetter {
            board: self.board.clone(),
        })
    }

    fn rollback(&mut self) -> ClientIntent {
        self.in_flight = None;
        self.board = self.staging.rollback(&self.board, &mut self.rack);
        self.rack.reset_selection();
        assert_invariants(self);
        ClientIntent::CancelMove {
            board: self.board.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RosterEntry;

    fn me() -> PlayerId {
        PlayerId::new("me")
    }

    fn deal(state: &mut SessionState, letters: &str) {
        state.apply_event(ServerEvent::LettersDistributed {
            players: vec![RackAssignment::new(
                me(),
                None,
                letters.chars().map(Glyph::new).collect(),
                None,
                Role::Member,
            )],
        });
    }

    fn my_game(letters: &str) -> SessionState {
        let mut state = SessionState::new(me(), 20, Role::Member);
        deal(&mut state, letters);
        state.apply_event(ServerEvent::TurnChanged { turn: me() });
        state
    }

    fn first_tile(state: &SessionState) -> TileId {
        *state.rack().tiles()[0].id()
    }

    #[test]
    fn test_stage_selected_requires_selection() {
        let mut state = my_game("AB");
        assert_eq!(
            state.stage_selected(Coord::new(0, 0)),
            Err(StageError::NoTileSelected)
        );
        let tile = first_tile(&state);
        assert!(state.select_tile(tile));
        assert!(matches!(
            state.stage_selected(Coord::new(0, 0)),
            Ok(ClientIntent::PlaceLetter { .. })
        ));
        assert_eq!(state.rack().selected(), None);
    }

    #[test]
    fn test_cancel_off_turn_is_noop() {
        let mut state = SessionState::new(me(), 20, Role::Member);
        assert_eq!(state.cancel(), None);
    }

    #[test]
    fn test_commit_with_nothing_staged_fails() {
        let mut state = my_game("AB");
        assert_eq!(state.begin_commit(), Err(SessionError::NothingStaged));
    }

    #[test]
    fn test_turn_lost_rolls_back_staging() {
        let mut state = my_game("AB");
        let tile = first_tile(&state);
        state.stage_tile(Coord::new(2, 2), tile).unwrap();

        let echo = state.apply_event(ServerEvent::TurnChanged {
            turn: PlayerId::new("other"),
        });
        assert!(matches!(echo, Some(ClientIntent::CancelMove { .. })));
        assert!(state.staging().is_empty());
        assert!(state.board().is_empty_at(Coord::new(2, 2)));
        assert_eq!(state.rack().len(), 2);
    }

    #[test]
    fn test_role_follows_roster() {
        let mut state = SessionState::new(me(), 20, Role::Member);
        assert_eq!(state.request_new_game(), Err(SessionError::NotAdministrator));

        state.apply_event(ServerEvent::ScoreUpdated(vec![RosterEntry::new(
            me(),
            "Me".to_string(),
            0,
            Role::Administrator,
        )]));
        state.set_language(Language::Russian).unwrap();
        assert_eq!(
            state.request_new_game(),
            Ok(ClientIntent::NewGame {
                language: Language::Russian
            })
        );
    }

    #[test]
    fn test_new_rack_discards_staging() {
        let mut state = my_game("AB");
        let tile = first_tile(&state);
        state.stage_tile(Coord::new(3, 3), tile).unwrap();

        let echo = state.apply_event(ServerEvent::LettersDistributed {
            players: vec![RackAssignment::new(
                me(),
                None,
                "XYZ".chars().map(Glyph::new).collect(),
                None,
                Role::Member,
            )],
        });
        assert!(state.staging().is_empty());
        assert!(state.board().is_empty_at(Coord::new(3, 3)));
        assert_eq!(state.rack().len(), 3);
        assert_eq!(
            echo,
            Some(ClientIntent::CancelMove {
                board: state.board().clone()
            })
        );
    }

    #[test]
    fn test_new_rack_without_staging_sends_nothing() {
        let mut state = my_game("AB");
        let echo = state.apply_event(ServerEvent::LettersDistributed {
            players: vec![RackAssignment::new(
                me(),
                None,
                "XYZ".chars().map(Glyph::new).collect(),
                None,
                Role::Member,
            )],
        });
        assert_eq!(echo, None);
        assert_eq!(state.rack().len(), 3);
    }

    #[test]
    fn test_stale_verdict_is_ignored() {
        let mut state = my_game("AB");
        let tile = first_tile(&state);
        state.stage_tile(Coord::new(0, 0), tile).unwrap();
        state.begin_commit().unwrap();
        state.apply_event(ServerEvent::TurnChanged {
            turn: PlayerId::new("other"),
        });
        assert_eq!(state.resolve_commit(Verdict::Accepted(5)), CommitOutcome::Stale);
    }

    #[test]
    fn test_verdict_for_changed_staging_is_stale() {
        let mut state = my_game("ABC");
        let a = first_tile(&state);
        state.stage_tile(Coord::new(0, 0), a).unwrap();
        let b = first_tile(&state);
        state.stage_tile(Coord::new(0, 1), b).unwrap();
        state.begin_commit().unwrap();

        let taken = Board::new(20)
            .place(Coord::new(0, 0), Glyph::new('A'))
            .unwrap()
            .place(Coord::new(0, 1), Glyph::new('Q'))
            .unwrap();
        state.apply_event(ServerEvent::BoardPlaced { board: taken });
        assert_eq!(state.staging().len(), 1);

        assert_eq!(state.resolve_commit(Verdict::Accepted(9)), CommitOutcome::Stale);
        assert_eq!(state.staging().len(), 1);
        assert_eq!(state.scores().score_of(&me()), None);
    }

    #[test]
    fn test_verdict_without_commit_is_stale() {
        let mut state = my_game("AB");
        let tile = first_tile(&state);
        state.stage_tile(Coord::new(0, 0), tile).unwrap();
        assert_eq!(state.resolve_commit(Verdict::Accepted(5)), CommitOutcome::Stale);
        assert_eq!(state.staging().len(), 1);
    }
}
