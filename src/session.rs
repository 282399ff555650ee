//! The running game view: one event loop per session.
//!
//! [`Session`] owns the [`SessionState`], the [`SessionSyncChannel`] and a
//! handle to the [`Authority`]. It reacts to three sources with
//! `tokio::select!`: player commands, channel events, and completions of
//! request/response calls. Calls run on spawned tasks so the loop never
//! waits on the network; while one is in flight, further moves are
//! answered with [`Notice::Busy`].

use crate::authority::{Authority, AuthorityError};
use crate::channel::{ChannelEvent, SessionSyncChannel};
use std::sync::Arc;
use strictly_wordgrid::{
    BoardError, ClientIntent, CommitOutcome, Coord, Glyph, Language, ServerEvent, SessionError,
    SessionState, StageError, Verdict,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// A player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Select the rack tile at a 1-based position.
    Select {
        /// Position in the rack as displayed.
        position: usize,
    },
    /// Drop the current selection.
    Deselect,
    /// Put the selected tile on a cell.
    Place(Coord),
    /// Submit the staged move for validation.
    Commit,
    /// Take back every staged tile.
    Cancel,
    /// Finish the turn and draw replacement tiles.
    EndTurn,
    /// Choose the language for the next game.
    Language(Language),
    /// Start a new game.
    StartGame,
    /// Leave the session.
    Quit,
}

/// Request/response call a notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Call {
    /// Move validation.
    #[display("validating the move")]
    Validate,
    /// Tile replenishment.
    #[display("drawing tiles")]
    DrawTiles,
}

/// Transient messages for the player.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Notice {
    /// The move was accepted.
    #[display("{} points added to you", _0)]
    PointsAwarded(u32),

    /// The move was rejected and taken back.
    #[display("Word does not exist")]
    WordInvalid,

    /// A call to the authority failed; local state is unchanged.
    #[display("Network failure while {call}: {message}")]
    NetworkFailure {
        /// Which call failed.
        call: Call,
        /// What went wrong.
        message: String,
        /// Whether repeating the action could succeed.
        retryable: bool,
    },

    /// Staged tiles changed while the move was being checked; nothing was scored.
    #[display("Board changed while the move was being checked")]
    Superseded,

    /// A request is still in flight.
    #[display("Still waiting for the server")]
    Busy,

    /// The action is not allowed right now.
    #[display("{}", _0)]
    Refused(String),

    /// The push channel dropped and is reconnecting.
    #[display("Connection lost ({reason}), reconnecting")]
    Disconnected {
        /// Why it dropped.
        reason: String,
    },

    /// The push channel is back.
    #[display("Reconnected")]
    Reconnected,

    /// The push channel is gone; the session ends.
    #[display("Disconnected: {reason}")]
    ConnectionLost {
        /// Why it closed.
        reason: String,
    },
}

/// What the session publishes to its front end.
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    /// The state after a change.
    State(Box<SessionState>),
    /// A transient message.
    Notice(Notice),
}

/// Result of a spawned call, fed back into the loop.
#[derive(Debug)]
enum Completion {
    Validation(Result<Verdict, AuthorityError>),
    Tiles(Result<Vec<Glyph>, AuthorityError>),
}

/// One player's live game session.
pub struct Session {
    state: SessionState,
    channel: SessionSyncChannel,
    authority: Arc<dyn Authority>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
    pending: Option<Call>,
}

impl Session {
    /// Creates a session and the receiver for its updates.
    pub fn new(
        state: SessionState,
        channel: SessionSyncChannel,
        authority: Arc<dyn Authority>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        (
            Self {
                state,
                channel,
                authority,
                updates,
                pending: None,
            },
            rx,
        )
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Runs until `Quit`, the command sender is dropped, or the channel closes.
    ///
    /// Tears down the subscription and the channel on the way out.
    #[instrument(skip_all, fields(player = %self.state.local_player()))]
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> SessionState {
        let (subscription, mut events) = self.channel.subscribe();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        info!("Session started");
        self.publish_state();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Quit) | None => {
                        info!("Leaving session");
                        break;
                    }
                    Some(command) => self.handle_command(command, &done_tx),
                },

                event = events.recv() => match event {
                    Some(ChannelEvent::Server(event)) => self.handle_event(event),
                    Some(ChannelEvent::Disconnected { reason }) => {
                        self.notify(Notice::Disconnected { reason });
                    }
                    Some(ChannelEvent::Reconnected { .. }) => self.notify(Notice::Reconnected),
                    Some(ChannelEvent::Closed { reason }) => {
                        self.notify(Notice::ConnectionLost { reason });
                        break;
                    }
                    None => {
                        warn!("Channel event stream ended");
                        break;
                    }
                },

                Some(done) = done_rx.recv() => self.handle_completion(done),
            }
        }

        subscription.dispose();
        let Session { state, channel, .. } = self;
        channel.disconnect().await;
        state
    }

    #[instrument(skip(self, done))]
    fn handle_command(&mut self, command: Command, done: &mpsc::UnboundedSender<Completion>) {
        if self.pending.is_some() && command.mutates() {
            debug!(?command, "Refusing command while a request is in flight");
            self.notify(Notice::Busy);
            return;
        }

        match command {
            Command::Select { position } => {
                let Some(tile) = self.state.rack().nth(position).map(|t| *t.id()) else {
                    debug!(position, "No tile at position");
                    return;
                };
                if self.state.select_tile(tile) {
                    self.publish_state();
                }
            }
            Command::Deselect => {
                if self.state.clear_selection() {
                    self.publish_state();
                }
            }
            Command::Place(coord) => match self.state.stage_selected(coord) {
                Ok(echo) => {
                    self.send(echo);
                    self.publish_state();
                }
                Err(StageError::Board(BoardError::CellOccupied(_))) => {
                    debug!(%coord, "Cell occupied, ignoring placement");
                }
                Err(e) => self.notify(Notice::Refused(e.to_string())),
            },
            Command::Commit => match self.state.begin_commit() {
                Ok(request) => {
                    self.pending = Some(Call::Validate);
                    let authority = Arc::clone(&self.authority);
                    let done = done.clone();
                    tokio::spawn(async move {
                        let result = authority.validate_move(&request).await;
                        let _ = done.send(Completion::Validation(result));
                    });
                }
                Err(SessionError::NothingStaged) => {
                    debug!("Nothing staged, commit ignored");
                }
                Err(e) => self.notify(Notice::Refused(e.to_string())),
            },
            Command::Cancel => {
                if let Some(echo) = self.state.cancel() {
                    self.send(echo);
                    self.publish_state();
                }
            }
            Command::EndTurn => match self.state.begin_end_turn() {
                Ok(plan) => {
                    if let Some(echo) = plan.cancel_echo {
                        self.send(echo);
                        self.publish_state();
                    }
                    self.pending = Some(Call::DrawTiles);
                    let authority = Arc::clone(&self.authority);
                    let done = done.clone();
                    let request = plan.request;
                    tokio::spawn(async move {
                        let result = authority.request_tiles(request).await;
                        let _ = done.send(Completion::Tiles(result));
                    });
                }
                Err(e) => self.notify(Notice::Refused(e.to_string())),
            },
            Command::Language(language) => match self.state.set_language(language) {
                Ok(()) => self.publish_state(),
                Err(e) => self.notify(Notice::Refused(e.to_string())),
            },
            Command::StartGame => match self.state.request_new_game() {
                Ok(intent) => self.send(intent),
                Err(e) => self.notify(Notice::Refused(e.to_string())),
            },
            Command::Quit => {}
        }
    }

    #[instrument(skip(self, event), fields(event = event.name()))]
    fn handle_event(&mut self, event: ServerEvent) {
        if let Some(echo) = self.state.apply_event(event) {
            self.send(echo);
        }
        self.publish_state();
    }

    #[instrument(skip(self))]
    fn handle_completion(&mut self, done: Completion) {
        self.pending = None;
        match done {
            Completion::Validation(Ok(verdict)) => match self.state.resolve_commit(verdict) {
                CommitOutcome::Accepted {
                    points,
                    score_request,
                } => {
                    self.send(score_request);
                    self.notify(Notice::PointsAwarded(points));
                }
                CommitOutcome::Rejected { cancel_echo } => {
                    self.send(cancel_echo);
                    self.notify(Notice::WordInvalid);
                }
                CommitOutcome::Stale => {
                    debug!("Dropping stale verdict");
                    self.notify(Notice::Superseded);
                }
            },
            Completion::Validation(Err(e)) => self.network_failure(Call::Validate, e),
            Completion::Tiles(Ok(letters)) => {
                if let Some(intent) = self.state.complete_end_turn(letters) {
                    self.send(intent);
                }
            }
            Completion::Tiles(Err(e)) => self.network_failure(Call::DrawTiles, e),
        }
        self.publish_state();
    }

    fn network_failure(&self, call: Call, error: AuthorityError) {
        warn!(%call, error = %error, "Authority call failed");
        self.notify(Notice::NetworkFailure {
            call,
            message: error.to_string(),
            retryable: error.is_retryable(),
        });
    }

    fn send(&self, intent: ClientIntent) {
        let name = intent.name();
        let queued = match intent {
            ClientIntent::NewGame { language } => self.channel.request_new_game(language),
            ClientIntent::PlaceLetter { board } => self.channel.broadcast_placement(board),
            ClientIntent::CancelMove { board } => self.channel.broadcast_cancel(board),
            ClientIntent::UpdateScore { uid, score } => {
                self.channel.request_score_update(uid, score)
            }
            ClientIntent::EndTurn => self.channel.request_end_turn(),
        };
        if let Err(e) = queued {
            warn!(event = name, error = %e, "Could not queue intent");
        }
    }

    fn notify(&self, notice: Notice) {
        debug!(%notice, "Notice");
        let _ = self.updates.send(SessionUpdate::Notice(notice));
    }

    fn publish_state(&self) {
        let _ = self
            .updates
            .send(SessionUpdate::State(Box::new(self.state.clone())));
    }
}

impl Command {
    /// Whether the command may change the board, rack or turn.
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            Command::Select { .. } | Command::Deselect | Command::Quit
        )
    }
}
