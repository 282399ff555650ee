//! Front-end state: the latest session snapshot, the cursor and the status line.

use super::input::move_cursor;
use crate::session::{Command, Notice, SessionUpdate};
use crossterm::event::KeyCode;
use strictly_wordgrid::{Coord, Language, STANDARD_SIZE, SessionState};
use strum::IntoEnumIterator;
use tracing::debug;

/// Main application state.
#[derive(Debug)]
pub struct App {
    state: Option<Box<SessionState>>,
    cursor: Coord,
    status_message: String,
    ended: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates the front end before the first state arrives.
    pub fn new() -> Self {
        Self {
            state: None,
            cursor: Coord::new(0, 0),
            status_message: "Waiting for game to start...".to_string(),
            ended: false,
        }
    }

    /// Latest published state, if any.
    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_deref()
    }

    /// Board cell under the cursor.
    pub fn cursor(&self) -> Coord {
        self.cursor
    }

    /// Gets the current status message.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Returns `true` once the session has stopped publishing.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Folds a session update into the view.
    pub fn handle_update(&mut self, update: SessionUpdate) {
        match update {
            SessionUpdate::State(state) => {
                let last = state.board().size().saturating_sub(1);
                self.cursor = Coord::new(self.cursor.row.min(last), self.cursor.col.min(last));
                self.state = Some(state);
            }
            SessionUpdate::Notice(notice) => {
                debug!(%notice, "Showing notice");
                self.status_message = notice_text(&notice);
            }
        }
    }

    /// Marks the session as finished; the next key press exits.
    pub fn end(&mut self) {
        self.ended = true;
        self.status_message = format!("{} Press any key to exit.", self.status_message);
    }

    /// Maps a key press to a session command, moving the cursor locally.
    pub fn handle_key(&mut self, key: KeyCode) -> Option<Command> {
        match key {
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                self.cursor = move_cursor(self.cursor, key, self.board_size());
                None
            }
            KeyCode::Char(c) if c.is_ascii_digit() => match c.to_digit(10) {
                Some(position) if position > 0 => Some(Command::Select {
                    position: position as usize,
                }),
                _ => None,
            },
            KeyCode::Enter | KeyCode::Char(' ') => Some(Command::Place(self.cursor)),
            KeyCode::Esc => Some(Command::Deselect),
            KeyCode::Char('c') => Some(Command::Commit),
            KeyCode::Char('x') => Some(Command::Cancel),
            KeyCode::Char('e') => Some(Command::EndTurn),
            KeyCode::Char('s') => Some(Command::StartGame),
            KeyCode::Char('l') => Some(Command::Language(self.next_language())),
            KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        }
    }

    fn board_size(&self) -> usize {
        self.state
            .as_ref()
            .map_or(STANDARD_SIZE, |state| state.board().size())
    }

    fn next_language(&self) -> Language {
        let current = self
            .state
            .as_ref()
            .map(|state| state.language())
            .unwrap_or_default();
        Language::iter()
            .cycle()
            .skip_while(|language| *language != current)
            .nth(1)
            .unwrap_or(current)
    }
}

/// One-line rendering of a notice for the status bar.
pub fn notice_text(notice: &Notice) -> String {
    match notice {
        Notice::NetworkFailure {
            retryable: true, ..
        } => format!("{notice} (try again)"),
        _ => notice.to_string(),
    }
}
