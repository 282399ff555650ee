//! Terminal UI for a running session.
//!
//! The UI never touches game state directly: it draws the latest
//! [`SessionUpdate`] and turns key presses into [`Command`]s for the session
//! loop.

mod app;
mod input;
mod ui;

pub use app::{App, notice_text};

use crate::session::{Command, SessionUpdate};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, instrument};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs the terminal UI until the player quits or the session ends.
///
/// Dropping `commands` on the way out also ends the session loop.
pub async fn run_tui(
    updates: mpsc::UnboundedReceiver<SessionUpdate>,
    commands: mpsc::Sender<Command>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, App::new(), updates, commands).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

#[instrument(skip_all)]
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
    mut updates: mpsc::UnboundedReceiver<SessionUpdate>,
    commands: mpsc::Sender<Command>,
) -> Result<()> {
    info!("Terminal UI started");
    loop {
        loop {
            match updates.try_recv() {
                Ok(update) => app.handle_update(update),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !app.is_ended() {
                        debug!("Session stopped publishing");
                        app.end();
                    }
                    break;
                }
            }
        }

        terminal.draw(|f| ui::draw(f, &app))?;

        // Check for keyboard input (non-blocking)
        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.is_ended() {
                    info!("Leaving after session end");
                    return Ok(());
                }
                if let Some(command) = app.handle_key(key.code) {
                    let quit = command == Command::Quit;
                    if commands.send(command).await.is_err() {
                        debug!("Session no longer accepts commands");
                    }
                    if quit {
                        info!("User quit");
                        return Ok(());
                    }
                }
            }
        }

        tokio::task::yield_now().await;
    }
}
