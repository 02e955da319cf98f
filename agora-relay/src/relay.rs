//! Relay server core: shared state, WebSocket handler and event dispatch.
//!
//! Every connection walks through three states:
//! 1. Connecting: the socket is upgraded and its writer task started.
//! 2. Active: `start` is queued, the sender joins the hub, the participant
//!    joins the registry, and inbound `setNickname`/`message` events are
//!    handled.
//! 3. Disconnected: others are told the participant left, the registry
//!    entry is removed and the participant list is re-broadcast.

use std::ops::ControlFlow;
use std::sync::Arc;

use agora_proto::chat::{self, ChatMessage};
use agora_proto::events::{self, ClientEvent, ServerEvent};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::config::DEFAULT_MAX_MESSAGE_SIZE;
use crate::connection::{ConnectionHandle, ConnectionId, Hub};
use crate::registry::SessionRegistry;
use crate::store::MessageStore;

/// Shared relay state: the broadcast hub, the participant registry and the
/// history store. Owned by the server and handed to every connection.
pub struct RelayState {
    /// Outbound channels of every open connection.
    pub hub: Arc<Hub>,
    /// Nicknames of connected participants.
    pub registry: SessionRegistry,
    /// Chat history.
    pub store: MessageStore,
    /// Maximum allowed inbound frame size in bytes.
    max_message_size: usize,
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayState {
    /// Creates a relay state with an in-memory store and default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_MAX_MESSAGE_SIZE, MessageStore::new())
    }

    /// Creates a relay state with a custom frame size limit and store.
    #[must_use]
    pub fn with_config(max_message_size: usize, store: MessageStore) -> Self {
        Self {
            hub: Arc::new(Hub::new()),
            registry: SessionRegistry::new(),
            store,
            max_message_size,
        }
    }
}

/// Handles an upgraded WebSocket connection for a single participant.
pub async fn handle_socket(socket: WebSocket, state: Arc<RelayState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let id = ConnectionId::new();
    let mut client = ConnectionHandle::new(id, Arc::clone(&state.hub));

    tracing::info!(conn = %client.id(), nickname = %client.nickname(), "participant connected");

    // Writer task: forwards everything queued for this connection.
    let writer_conn = client.id().clone();
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(conn = %writer_conn, "WebSocket write failed");
                break;
            }
        }
    });

    on_connect(&client, tx, &state).await;

    loop {
        tokio::select! {
            frame = ws_receiver.next() => {
                let Some(Ok(msg)) = frame else {
                    break;
                };
                if handle_frame(&mut client, msg, &state).await.is_break() {
                    break;
                }
            }
            _ = &mut write_task => {
                break;
            }
        }
    }

    on_disconnect(&client, &state).await;
    write_task.abort();

    tracing::info!(conn = %client.id(), nickname = %client.nickname(), "participant disconnected");
}

/// Entry into the Active state.
///
/// The connection joins the hub only once `start` is queued on it, so
/// `start` is always its first frame.
async fn on_connect(
    client: &ConnectionHandle,
    tx: mpsc::UnboundedSender<Message>,
    state: &RelayState,
) {
    let message_history = state
        .store
        .all()
        .await
        .iter()
        .map(ChatMessage::render)
        .collect();
    let start = ServerEvent::Start {
        nickname: client.nickname().to_string(),
        message_history,
    };
    state.hub.register_after(client.id(), tx, &start).await;

    state.registry.add(client.nickname());
    broadcast_online_users(client, state).await;
}

/// Dispatches one inbound frame. `Break` ends the session.
async fn handle_frame(
    client: &mut ConnectionHandle,
    msg: Message,
    state: &RelayState,
) -> ControlFlow<()> {
    let text = match msg {
        Message::Text(text) => text,
        Message::Close(_) => {
            tracing::info!(conn = %client.id(), "received close frame");
            return ControlFlow::Break(());
        }
        Message::Binary(_) => {
            tracing::warn!(conn = %client.id(), "ignoring binary frame");
            return ControlFlow::Continue(());
        }
        // Ping and pong are answered by the transport.
        _ => return ControlFlow::Continue(()),
    };

    if text.len() > state.max_message_size {
        tracing::warn!(
            conn = %client.id(),
            size = text.len(),
            max = state.max_message_size,
            "frame exceeds size limit"
        );
        return ControlFlow::Continue(());
    }

    let event = match events::decode(text.as_str()) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(conn = %client.id(), error = %e, "failed to decode event");
            return ControlFlow::Continue(());
        }
    };

    match event {
        ClientEvent::SetNickname(new) => on_rename(client, state, new).await,
        ClientEvent::Message {
            nickname,
            chat_message,
        } => on_message(client, state, &nickname, chat_message).await,
        ClientEvent::Disconnect => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

/// `setNickname`: announce, update the registry and the local name, then
/// re-broadcast the participant list.
async fn on_rename(client: &mut ConnectionHandle, state: &RelayState, new: String) {
    if new.trim().is_empty() {
        tracing::warn!(conn = %client.id(), "ignoring empty nickname");
        return;
    }

    let notice = chat::rename_notice(client.nickname(), &new);
    client.send_to_all(&ServerEvent::Message(notice)).await;

    state.registry.rename(client.nickname(), &new);
    tracing::info!(conn = %client.id(), old = %client.nickname(), new = %new, "nickname changed");
    client.set_nickname(new);

    broadcast_online_users(client, state).await;
}

/// `message`: persist, render and broadcast.
///
/// The message is attributed to the connection's registered nickname; the
/// nickname the client claims is only compared for diagnostics.
async fn on_message(client: &ConnectionHandle, state: &RelayState, claimed: &str, body: String) {
    if claimed != client.nickname() {
        tracing::debug!(
            conn = %client.id(),
            claimed = %claimed,
            nickname = %client.nickname(),
            "client-supplied nickname overridden"
        );
    }

    let message = ChatMessage::new(client.nickname(), body);
    match state.store.create(message).await {
        Ok(stored) => {
            client
                .send_to_all(&ServerEvent::Message(stored.render()))
                .await;
        }
        Err(e) => {
            tracing::error!(conn = %client.id(), error = %e, "failed to persist chat message");
        }
    }
}

/// Transition to Disconnected.
async fn on_disconnect(client: &ConnectionHandle, state: &RelayState) {
    client
        .send_to_others(&ServerEvent::Message(chat::departure_notice(
            client.nickname(),
        )))
        .await;
    state.registry.remove(client.nickname());
    state.hub.unregister(client.id()).await;
    broadcast_online_users(client, state).await;
}

async fn broadcast_online_users(client: &ConnectionHandle, state: &RelayState) {
    client
        .send_to_all(&ServerEvent::OnlineUsers(state.registry.list()))
        .await;
}

/// Starts the relay server on the given address and returns the bound address
/// and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(RelayState::new())).await
}

/// Starts the relay server with a pre-configured [`RelayState`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<RelayState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(ws_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "relay server error");
        }
    });

    Ok((bound_addr, handle))
}

/// axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    axum::extract::State(state): axum::extract::State<Arc<RelayState>>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}
