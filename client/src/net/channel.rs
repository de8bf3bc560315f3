//! Shared, self-healing websocket channels keyed by path.
//!
//! SYSTEM CONTEXT
//! ==============
//! Screens open `/game/{id}` or `/player/{id}` and get a [`Channel`] handle.
//! Handles for the same path share one socket; the socket is torn down when
//! the last handle is dropped.
//!
//! DESIGN
//! ======
//! - One background task per path owns the connect/read/reconnect loop.
//! - Inbound text lands in a single-slot mailbox (`watch`): consumers see the
//!   most recent message. Each message carries a sequence number so a consumer
//!   can tell that it skipped one and needs to re-sync.
//! - Reconnects use capped exponential backoff with jitter and reset after a
//!   successful open. The session token is re-read on every attempt.
//!
//! ERROR HANDLING
//! ==============
//! Connect and socket failures never reach consumers as errors; they surface
//! as status transitions plus `tracing` warnings while the loop retries.
//! Sends while not open fail with [`SendError::NotOpen`] and are not queued.

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, ReconnectPolicy};
use crate::state::auth::SessionProvider;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Open,
    Closing,
    Closed,
}

/// One inbound text message. `seq` increases by one per message on a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inbound {
    pub seq: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("channel {path} is not open")]
    NotOpen { path: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("connection refused: {0}")]
    Refused(String),
}

/// An open transport: text frames out, text frames in. The inbound side ends
/// when the socket closes.
pub struct Connection {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

/// Opens transports for the reconnect loop.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Connection, ChannelError>;
}

/// Production connector over `tokio-tungstenite`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Connection, ChannelError> {
        let (stream, _) = connect_async(url).await.map_err(|e| ChannelError::Connect(Box::new(e)))?;
        let (mut sink, mut source) = stream.split();
        let (outbound, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, inbound) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outgoing = out_rx.recv() => {
                        let Some(text) = outgoing else {
                            let _ = sink.close().await;
                            break;
                        };
                        if let Err(e) = sink.send(Message::text(text)).await {
                            warn!(error = %e, "ws: send failed");
                            break;
                        }
                    }
                    incoming = source.next() => {
                        match incoming {
                            Some(Ok(Message::Text(text))) => {
                                if in_tx.send(text.as_str().to_owned()).is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!(error = %e, "ws: recv failed");
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok(Connection { outbound, inbound })
    }
}

/// Capped exponential reconnect delay with additive jitter.
#[derive(Clone, Debug)]
pub struct Backoff {
    policy: ReconnectPolicy,
    next_ms: u64,
}

impl Backoff {
    /// A zero base is raised to 1 ms so the delay always grows.
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        let base_ms = policy.base_ms.max(1);
        let policy = ReconnectPolicy { base_ms, max_ms: policy.max_ms.max(base_ms), ..policy };
        Self { policy, next_ms: base_ms }
    }

    pub fn reset(&mut self) {
        self.next_ms = self.policy.base_ms;
    }

    /// Delay before the next attempt; doubles up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.next_ms;
        self.next_ms = self.next_ms.saturating_mul(2).min(self.policy.max_ms);
        let jitter = if self.policy.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.policy.jitter_ms)
        };
        Duration::from_millis(base.saturating_add(jitter))
    }
}

/// Append the bearer token as a `token` query parameter.
#[must_use]
pub fn authorized_url(url: &str, token: Option<&str>) -> String {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return url.to_owned();
    };
    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.query_pairs_mut().append_pair("token", token);
            parsed.into()
        }
        Err(e) => {
            warn!(error = %e, "channel: unparsable url; connecting without token");
            url.to_owned()
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared {
    path: String,
    status: watch::Sender<ConnectionStatus>,
    mailbox: watch::Sender<Option<Inbound>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl Shared {
    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }
}

struct ChannelInner {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl Drop for ChannelInner {
    fn drop(&mut self) {
        self.shared.set_status(ConnectionStatus::Closing);
        self.task.abort();
        lock(&self.shared.outbound).take();
        self.shared.set_status(ConnectionStatus::Closed);
        info!(path = %self.shared.path, "channel: released");
    }
}

/// Handle to a shared channel. Clones share the same socket.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

impl Channel {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.inner.shared.path
    }

    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        *self.inner.shared.status.borrow()
    }

    /// Latest inbound message, if any arrived since the channel opened.
    #[must_use]
    pub fn received_message(&self) -> Option<Inbound> {
        self.inner.shared.mailbox.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.shared.status.subscribe()
    }

    #[must_use]
    pub fn subscribe_messages(&self) -> watch::Receiver<Option<Inbound>> {
        self.inner.shared.mailbox.subscribe()
    }

    /// Whether two handles share one underlying socket.
    #[must_use]
    pub fn same_channel(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Send text if the socket is open.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::NotOpen`] while connecting or closed; the payload
    /// is dropped, not queued.
    pub fn send_message(&self, payload: &str) -> Result<(), SendError> {
        let shared = &self.inner.shared;
        let not_open = || {
            warn!(path = %shared.path, "channel: send while not open; dropped");
            SendError::NotOpen { path: shared.path.clone() }
        };
        if *shared.status.borrow() != ConnectionStatus::Open {
            return Err(not_open());
        }
        let outbound = lock(&shared.outbound);
        let Some(sender) = outbound.as_ref() else {
            return Err(not_open());
        };
        sender.send(payload.to_owned()).map_err(|_| not_open())
    }
}

/// Hands out one shared [`Channel`] per path.
pub struct ChannelRegistry {
    ws_url: String,
    policy: ReconnectPolicy,
    session: Arc<dyn SessionProvider>,
    connector: Arc<dyn Connector>,
    channels: Mutex<HashMap<String, Weak<ChannelInner>>>,
}

impl ChannelRegistry {
    #[must_use]
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionProvider>, connector: Arc<dyn Connector>) -> Self {
        Self {
            ws_url: config.ws_url.clone(),
            policy: config.reconnect,
            session,
            connector,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Channel for `path` (e.g. `/game/{id}`), reusing a live one if present.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn open(&self, path: &str) -> Channel {
        let mut channels = lock(&self.channels);
        channels.retain(|_, weak| weak.strong_count() > 0);
        if let Some(inner) = channels.get(path).and_then(Weak::upgrade) {
            debug!(%path, "channel: reusing live channel");
            return Channel { inner };
        }

        let (status, _) = watch::channel(ConnectionStatus::Connecting);
        let (mailbox, _) = watch::channel(None);
        let shared = Arc::new(Shared { path: path.to_owned(), status, mailbox, outbound: Mutex::new(None) });
        let task = tokio::spawn(run_channel(
            Arc::clone(&shared),
            format!("{}{}", self.ws_url, path),
            Arc::clone(&self.session),
            Arc::clone(&self.connector),
            self.policy,
        ));

        let inner = Arc::new(ChannelInner { shared, task });
        channels.insert(path.to_owned(), Arc::downgrade(&inner));
        info!(%path, "channel: opened");
        Channel { inner }
    }

    /// Number of paths with at least one live handle.
    #[must_use]
    pub fn live_channels(&self) -> usize {
        lock(&self.channels).values().filter(|weak| weak.strong_count() > 0).count()
    }
}

async fn run_channel(
    shared: Arc<Shared>,
    url: String,
    session: Arc<dyn SessionProvider>,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
) {
    let mut backoff = Backoff::new(policy);
    let mut seq: u64 = 0;

    loop {
        shared.set_status(ConnectionStatus::Connecting);
        let token = session.current_user().and_then(|user| user.bearer().map(str::to_owned));
        let target = authorized_url(&url, token.as_deref());

        match connector.connect(&target).await {
            Ok(Connection { outbound, mut inbound }) => {
                *lock(&shared.outbound) = Some(outbound);
                shared.set_status(ConnectionStatus::Open);
                backoff.reset();
                info!(path = %shared.path, "channel: open");

                while let Some(text) = inbound.recv().await {
                    seq += 1;
                    shared.mailbox.send_replace(Some(Inbound { seq, text }));
                }

                lock(&shared.outbound).take();
                shared.set_status(ConnectionStatus::Closed);
                info!(path = %shared.path, "channel: closed by peer");
            }
            Err(e) => {
                warn!(path = %shared.path, error = %e, "channel: connect failed");
                shared.set_status(ConnectionStatus::Closed);
            }
        }

        let delay = backoff.next_delay();
        debug!(path = %shared.path, ?delay, "channel: reconnecting");
        tokio::time::sleep(delay).await;
    }
}
