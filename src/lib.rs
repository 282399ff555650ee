//! Strictly Letters - multiplayer word-board client
//!
//! Keeps one player's view of a shared letter board in sync with an
//! authoritative game service. The rules of the game live in
//! [`strictly_wordgrid`]; this crate wires them to the network.
//!
//! # Architecture
//!
//! - **Authority**: request/response calls (move validation, tile draws) over HTTP
//! - **Channel**: the push-event link, with reconnects and disposable subscriptions
//! - **Transport**: WebSocket and in-memory frame carriers behind one trait
//! - **Session**: the event loop that applies commands, events and verdicts
//! - **Config**: TOML settings with environment and default fallbacks
//! - **TUI**: the ratatui front end that draws updates and maps keys to commands
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_letters::{ClientConfig, HttpAuthority, Session, SessionSyncChannel, WsConnector};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::load(None)?;
//! let authority = HttpAuthority::new(
//!     config.authority_url(),
//!     config.request_timeout(),
//!     config.retry_policy(),
//! )?;
//! let channel = SessionSyncChannel::connect(
//!     WsConnector::new(config.events_url().clone()),
//!     config.reconnect_policy(),
//! )
//! .await?;
//! let (session, _updates) = Session::new(config.initial_state(), channel, Arc::new(authority));
//! let (_commands, rx) = tokio::sync::mpsc::channel(16);
//! session.run(rx).await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod authority;
mod channel;
mod config;
mod session;
mod transport;
mod tui;

// Crate-level exports - Authority calls
pub use authority::{Authority, AuthorityError, HttpAuthority, RetryPolicy};

// Crate-level exports - Push channel
pub use channel::{ChannelError, ChannelEvent, ReconnectPolicy, SessionSyncChannel, Subscription};

// Crate-level exports - Transports
pub use transport::{
    Connector, LoopbackConnector, LoopbackRemote, LoopbackTransport, Transport, TransportError,
    WsConnector, WsTransport, loopback,
};

// Crate-level exports - Session loop
pub use session::{Call, Command, Notice, Session, SessionUpdate};

// Crate-level exports - Configuration
pub use config::{
    CONFIG_PATH_VAR, ClientConfig, ConfigError, DEFAULT_CONFIG_FILE, ReconnectSettings,
    RetrySettings,
};

// Crate-level exports - Terminal front end
pub use tui::{App, notice_text, run_tui};
