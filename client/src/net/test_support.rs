//! In-memory transport for tests of channel consumers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::{ClientConfig, ReconnectPolicy};
use crate::net::channel::{Channel, ChannelError, Connection, ConnectionStatus, Connector, Inbound};
use crate::state::auth::{CurrentUser, SessionProvider, StaticSession};

pub const WAIT: Duration = Duration::from_secs(2);

/// Server side of a mock connection.
pub struct MockSocket {
    pub url: String,
    pub to_client: mpsc::UnboundedSender<String>,
    pub from_client: mpsc::UnboundedReceiver<String>,
}

/// Refuses the first `refusals` attempts, then hands each new socket to the
/// test through a channel.
pub struct MockConnector {
    refusals: AtomicUsize,
    attempts: Mutex<Vec<String>>,
    sockets: mpsc::UnboundedSender<MockSocket>,
}

impl MockConnector {
    pub fn new(refusals: usize) -> (Arc<Self>, mpsc::UnboundedReceiver<MockSocket>) {
        let (sockets, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self { refusals: AtomicUsize::new(refusals), attempts: Mutex::new(Vec::new()), sockets });
        (connector, rx)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> Result<Connection, ChannelError> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner).push(url.to_owned());
        let refuse = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refuse {
            return Err(ChannelError::Refused("mock refusal".to_owned()));
        }

        let (outbound, from_client) = mpsc::unbounded_channel();
        let (to_client, inbound) = mpsc::unbounded_channel();
        let _ = self.sockets.send(MockSocket { url: url.to_owned(), to_client, from_client });
        Ok(Connection { outbound, inbound })
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        api_url: "http://backend/api".to_owned(),
        ws_url: "ws://backend/ws".to_owned(),
        app_url: "http://app".to_owned(),
        reconnect: ReconnectPolicy { base_ms: 5, max_ms: 20, jitter_ms: 0 },
    }
}

pub fn test_session(username: &str, token: Option<&str>) -> Arc<dyn SessionProvider> {
    Arc::new(StaticSession::new(CurrentUser {
        username: username.to_owned(),
        player_id: Some(format!("{username}-id")),
        token: token.map(str::to_owned),
    }))
}

pub async fn next_socket(rx: &mut mpsc::UnboundedReceiver<MockSocket>) -> MockSocket {
    timeout(WAIT, rx.recv()).await.expect("socket in time").expect("socket")
}

pub async fn wait_for_status(channel: &Channel, wanted: ConnectionStatus) {
    let mut rx = channel.subscribe_status();
    timeout(WAIT, rx.wait_for(|status| *status == wanted))
        .await
        .expect("status in time")
        .expect("channel alive");
}

pub async fn wait_for_seq(channel: &Channel, seq: u64) -> Inbound {
    let mut rx = channel.subscribe_messages();
    let seen = timeout(WAIT, rx.wait_for(|msg| msg.as_ref().is_some_and(|m| m.seq >= seq)))
        .await
        .expect("message in time")
        .expect("channel alive")
        .clone();
    seen.expect("message")
}
