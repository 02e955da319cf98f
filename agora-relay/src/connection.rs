//! Connection hub and per-connection send handles.
//!
//! The [`Hub`] owns the sender half of every connection's outbound channel
//! and is the relay's broadcast surface. A [`ConnectionHandle`] wraps one
//! connection: its id, its current nickname, and a reference to the hub.

use std::collections::HashMap;
use std::sync::Arc;

use agora_proto::events::{self, ServerEvent};
use axum::extract::ws::Message;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// Number of id characters used for a connection's default nickname.
pub const DEFAULT_NICKNAME_LEN: usize = 16;

/// Unique identifier for a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Creates a fresh random connection id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Nickname a connection starts with: the first
    /// [`DEFAULT_NICKNAME_LEN`] characters of its id.
    #[must_use]
    pub fn default_nickname(&self) -> String {
        self.0.chars().take(DEFAULT_NICKNAME_LEN).collect()
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of outbound channels for every open connection.
#[derive(Default)]
pub struct Hub {
    connections: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<Message>>>,
}

impl Hub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection's sender.
    pub async fn register(&self, id: &ConnectionId, sender: mpsc::UnboundedSender<Message>) {
        let mut conns = self.connections.write().await;
        conns.insert(id.clone(), sender);
    }

    /// Queues `greeting` on `sender`, then registers it. Nothing broadcast
    /// through the hub can reach the connection ahead of the greeting.
    pub async fn register_after(
        &self,
        id: &ConnectionId,
        sender: mpsc::UnboundedSender<Message>,
        greeting: &ServerEvent,
    ) {
        if let Some(frame) = encode_frame(greeting)
            && sender.send(frame).is_err()
        {
            tracing::debug!(conn = %id, "greeting to closed connection dropped");
        }
        self.register(id, sender).await;
    }

    /// Removes a connection, returning its sender if it existed.
    pub async fn unregister(&self, id: &ConnectionId) -> Option<mpsc::UnboundedSender<Message>> {
        let mut conns = self.connections.write().await;
        conns.remove(id)
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Returns `true` when no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Sends an event to a single connection.
    pub async fn send_to(&self, id: &ConnectionId, event: &ServerEvent) {
        let Some(frame) = encode_frame(event) else {
            return;
        };
        let conns = self.connections.read().await;
        if let Some(sender) = conns.get(id)
            && sender.send(frame).is_err()
        {
            tracing::debug!(conn = %id, "send to closed connection dropped");
        }
    }

    /// Sends an event to every connection, optionally skipping one.
    pub async fn broadcast(&self, event: &ServerEvent, except: Option<&ConnectionId>) {
        let Some(frame) = encode_frame(event) else {
            return;
        };
        let conns = self.connections.read().await;
        for (id, sender) in conns.iter() {
            if Some(id) == except {
                continue;
            }
            if sender.send(frame.clone()).is_err() {
                tracing::debug!(conn = %id, "broadcast to closed connection dropped");
            }
        }
    }
}

/// Encodes an event into a text frame, logging on failure.
fn encode_frame(event: &ServerEvent) -> Option<Message> {
    match events::encode(event) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode server event");
            None
        }
    }
}

/// One live connection as seen by the relay.
///
/// Send failures are never surfaced: the transport is the only delivery
/// guarantee.
pub struct ConnectionHandle {
    id: ConnectionId,
    nickname: String,
    hub: Arc<Hub>,
}

impl ConnectionHandle {
    /// Wraps a connection, starting with its default nickname.
    #[must_use]
    pub fn new(id: ConnectionId, hub: Arc<Hub>) -> Self {
        let nickname = id.default_nickname();
        Self { id, nickname, hub }
    }

    /// The connection id.
    #[must_use]
    pub const fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// The connection's current nickname.
    #[must_use]
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Replaces the connection's local nickname.
    pub fn set_nickname(&mut self, nickname: String) {
        self.nickname = nickname;
    }

    /// Sends to this connection only.
    pub async fn send_to_self(&self, event: &ServerEvent) {
        self.hub.send_to(&self.id, event).await;
    }

    /// Sends to every connection, this one included.
    pub async fn send_to_all(&self, event: &ServerEvent) {
        self.hub.broadcast(event, None).await;
    }

    /// Sends to every connection except this one.
    pub async fn send_to_others(&self, event: &ServerEvent) {
        self.hub.broadcast(event, Some(&self.id)).await;
    }
}
