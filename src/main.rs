//! Strictly Letters - terminal client
//!
//! Joins a shared word board as one player and keeps the local view in sync
//! with the authoritative game service.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, CliCommand};
use std::path::PathBuf;
use std::sync::Arc;
use strictly_letters::{ClientConfig, HttpAuthority, Session, SessionSyncChannel, WsConnector, run_tui};
use tokio::sync::mpsc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "strictly_letters.log";
const COMMAND_BUFFER: usize = 32;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        CliCommand::Play { config } => run_play(config).await,
    }
}

/// Play one session in the terminal UI
#[instrument(skip_all)]
async fn run_play(config_path: Option<PathBuf>) -> Result<()> {
    // Log to a file so traces don't interfere with the TUI
    let log_file = std::fs::File::create(LOG_FILE)
        .with_context(|| format!("Failed to create {LOG_FILE}"))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,strictly_letters=debug,strictly_wordgrid=debug")
            }),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();

    let config = ClientConfig::load(config_path.as_deref())?;
    info!(
        player = %config.player_id(),
        authority = %config.authority_url(),
        events = %config.events_url(),
        "Starting Strictly Letters"
    );

    let authority = HttpAuthority::new(
        config.authority_url(),
        config.request_timeout(),
        config.retry_policy(),
    )?;
    let channel = SessionSyncChannel::connect(
        WsConnector::new(config.events_url().clone()),
        config.reconnect_policy(),
    )
    .await
    .with_context(|| format!("Failed to reach {}", config.events_url()))?;

    let (session, updates) = Session::new(config.initial_state(), channel, Arc::new(authority));
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let session_task = tokio::spawn(session.run(command_rx));

    let ui_result = run_tui(updates, command_tx).await;
    let final_state = session_task.await.context("Session task failed")?;
    ui_result?;

    let score = final_state
        .scores()
        .score_of(final_state.local_player())
        .unwrap_or(0);
    info!(score, "Session finished");
    println!("Session over. Final score: {score}");
    Ok(())
}
