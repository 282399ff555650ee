//! The session's only link to the authority's push channel.
//!
//! [`SessionSyncChannel`] owns a background task that multiplexes outbound
//! intents and inbound events over a [`Transport`] with `tokio::select!`,
//! reconnecting through its [`Connector`] when the link drops. Inbound
//! traffic reaches the session through subscriptions; each
//! [`Subscription`] removes itself when disposed or dropped, so no handler
//! outlives the session that registered it.

use crate::transport::{Connector, Transport, TransportError};
use derive_setters::Setters;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use strictly_wordgrid::{Board, ClientIntent, Language, PlayerId, ServerEvent};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Bounded reconnection with linearly growing delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Setters)]
#[setters(prefix = "with_")]
pub struct ReconnectPolicy {
    /// Attempts after a drop before giving up; zero disables reconnecting.
    pub max_attempts: u32,
    /// Delay before the first attempt; attempt `n` waits `n` times this.
    pub backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(500),
        }
    }
}

/// What subscribers receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// An authoritative event.
    Server(ServerEvent),
    /// The link dropped; reconnecting.
    Disconnected {
        /// Why the link dropped.
        reason: String,
    },
    /// The link is back after a drop.
    Reconnected {
        /// Attempt that succeeded.
        attempt: u32,
    },
    /// The channel is gone for good. Always the last event.
    Closed {
        /// Why it closed.
        reason: String,
    },
}

/// Error from the channel.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ChannelError {
    /// The initial connection failed.
    #[display("Could not connect: {}", _0)]
    Connect(TransportError),

    /// The background task has stopped.
    #[display("Channel closed")]
    Closed,
}

impl std::error::Error for ChannelError {}

type Subscribers = Mutex<HashMap<u64, mpsc::UnboundedSender<ChannelEvent>>>;

/// Disposer for a subscription.
///
/// Dropping it has the same effect as [`Subscription::dispose`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    subscribers: Weak<Subscribers>,
}

impl Subscription {
    /// Stops delivery to this subscription's receiver.
    pub fn dispose(self) {
        // Removal happens in `Drop`.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            if let Ok(mut map) = subscribers.lock() {
                map.remove(&self.id);
                debug!(subscription = self.id, "Subscription disposed");
            }
        }
    }
}

/// Client side of the push channel.
pub struct SessionSyncChannel {
    intents: mpsc::UnboundedSender<ClientIntent>,
    subscribers: Arc<Subscribers>,
    next_subscription: AtomicU64,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SessionSyncChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSyncChannel")
            .field("subscribers", &self.subscriber_count())
            .field("running", &self.task.is_some())
            .finish()
    }
}

impl SessionSyncChannel {
    /// Opens the channel and starts its background task.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Connect`] if the first connection cannot be opened.
    #[instrument(skip(connector))]
    pub async fn connect<C: Connector>(
        mut connector: C,
        policy: ReconnectPolicy,
    ) -> Result<Self, ChannelError> {
        let transport = connector.connect().await.map_err(ChannelError::Connect)?;
        info!("Session channel connected");

        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let subscribers: Arc<Subscribers> = Arc::new(Mutex::new(HashMap::new()));

        let task = tokio::spawn(connection_loop(
            connector,
            transport,
            policy,
            intent_rx,
            Arc::clone(&subscribers),
            shutdown_rx,
        ));

        Ok(Self {
            intents: intent_tx,
            subscribers,
            next_subscription: AtomicU64::new(0),
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Registers for inbound traffic.
    ///
    /// Returns the disposer and the receiving end.
    pub fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<ChannelEvent>) {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        match self.subscribers.lock() {
            Ok(mut map) => {
                map.insert(id, tx);
            }
            Err(e) => error!(error = %e, "Subscriber registry poisoned"),
        }
        debug!(subscription = id, "Subscribed");
        (
            Subscription {
                id,
                subscribers: Arc::downgrade(&self.subscribers),
            },
            rx,
        )
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|map| map.len()).unwrap_or(0)
    }

    #[instrument(skip(self, intent), fields(event = intent.name()))]
    fn send(&self, intent: ClientIntent) -> Result<(), ChannelError> {
        self.intents.send(intent).map_err(|_| ChannelError::Closed)
    }

    /// Asks the authority to start a game.
    ///
    /// Every outbound operation fails with [`ChannelError::Closed`] once the
    /// background task has stopped.
    pub fn request_new_game(&self, language: Language) -> Result<(), ChannelError> {
        self.send(ClientIntent::NewGame { language })
    }

    /// Echoes a staged placement to the other players.
    pub fn broadcast_placement(&self, board: Board) -> Result<(), ChannelError> {
        self.send(ClientIntent::PlaceLetter { board })
    }

    /// Echoes a rollback to the other players.
    pub fn broadcast_cancel(&self, board: Board) -> Result<(), ChannelError> {
        self.send(ClientIntent::CancelMove { board })
    }

    /// Asks the authority to credit points.
    pub fn request_score_update(&self, uid: PlayerId, score: u32) -> Result<(), ChannelError> {
        self.send(ClientIntent::UpdateScore { uid, score })
    }

    /// Asks the authority to pass the turn.
    pub fn request_end_turn(&self) -> Result<(), ChannelError> {
        self.send(ClientIntent::EndTurn)
    }

    /// Closes the connection and waits briefly for the task to finish.
    #[instrument(skip(self))]
    pub async fn disconnect(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut task).await {
                Ok(_) => debug!("Channel task finished"),
                Err(_) => {
                    warn!("Channel task did not stop in time, aborting");
                    task.abort();
                }
            }
        }
        info!("Session channel disconnected");
    }
}

impl Drop for SessionSyncChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn broadcast(subscribers: &Subscribers, event: ChannelEvent) {
    let Ok(mut map) = subscribers.lock() else {
        error!("Subscriber registry poisoned");
        return;
    };
    map.retain(|id, tx| {
        let alive = tx.send(event.clone()).is_ok();
        if !alive {
            debug!(subscription = id, "Dropping closed subscriber");
        }
        alive
    });
}

/// Sends the final `Closed` event and releases every subscriber.
fn close_all(subscribers: &Subscribers, reason: String) {
    broadcast(subscribers, ChannelEvent::Closed { reason });
    if let Ok(mut map) = subscribers.lock() {
        map.clear();
    }
}

/// Why the inner loop stopped.
enum Interrupt {
    /// Shutdown requested or the channel handle is gone.
    Stop,
    /// The transport failed.
    Dropped(String),
}

async fn connection_loop<C: Connector>(
    mut connector: C,
    mut transport: C::Transport,
    policy: ReconnectPolicy,
    mut intents: mpsc::UnboundedReceiver<ClientIntent>,
    subscribers: Arc<Subscribers>,
    mut shutdown: oneshot::Receiver<()>,
) {
    debug!("Connection loop started");
    loop {
        let interrupt = pump(&mut transport, &mut intents, &subscribers, &mut shutdown).await;
        match interrupt {
            Interrupt::Stop => {
                let _ = transport.close().await;
                close_all(&subscribers, "client shut down".to_string());
                break;
            }
            Interrupt::Dropped(reason) => {
                warn!(reason = %reason, "Connection dropped");
                broadcast(
                    &subscribers,
                    ChannelEvent::Disconnected {
                        reason: reason.clone(),
                    },
                );
                match reconnect(&mut connector, policy, &mut shutdown).await {
                    Some((fresh, attempt)) => {
                        transport = fresh;
                        broadcast(&subscribers, ChannelEvent::Reconnected { attempt });
                    }
                    None => {
                        close_all(&subscribers, reason);
                        break;
                    }
                }
            }
        }
    }
    debug!("Connection loop exited");
}

async fn pump<T: Transport>(
    transport: &mut T,
    intents: &mut mpsc::UnboundedReceiver<ClientIntent>,
    subscribers: &Subscribers,
    shutdown: &mut oneshot::Receiver<()>,
) -> Interrupt {
    loop {
        tokio::select! {
            intent = intents.recv() => {
                let Some(intent) = intent else {
                    debug!("Intent sender dropped");
                    return Interrupt::Stop;
                };
                let frame = match serde_json::to_string(&intent) {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!(error = %e, "Failed to serialize intent");
                        continue;
                    }
                };
                debug!(event = intent.name(), "Sending intent");
                if let Err(e) = transport.send(frame).await {
                    return Interrupt::Dropped(e.to_string());
                }
            }

            _ = &mut *shutdown => {
                debug!("Shutdown requested");
                return Interrupt::Stop;
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(frame)) => match serde_json::from_str::<ServerEvent>(&frame) {
                        Ok(event) => {
                            debug!(event = event.name(), "Received event");
                            broadcast(subscribers, ChannelEvent::Server(event));
                        }
                        Err(e) => warn!(error = %e, frame = %frame, "Ignoring unrecognized frame"),
                    },
                    Some(Err(e)) => return Interrupt::Dropped(e.to_string()),
                    None => return Interrupt::Dropped("closed by server".to_string()),
                }
            }
        }
    }
}

async fn reconnect<C: Connector>(
    connector: &mut C,
    policy: ReconnectPolicy,
    shutdown: &mut oneshot::Receiver<()>,
) -> Option<(C::Transport, u32)> {
    for attempt in 1..=policy.max_attempts {
        let delay = policy.backoff.saturating_mul(attempt);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = &mut *shutdown => return None,
        }
        match connector.connect().await {
            Ok(transport) => {
                info!(attempt, "Reconnected");
                return Some((transport, attempt));
            }
            Err(e) => warn!(attempt, error = %e, "Reconnect attempt failed"),
        }
    }
    error!(attempts = policy.max_attempts, "Giving up on reconnecting");
    None
}
