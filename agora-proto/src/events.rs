//! Relay wire events.
//!
//! Every WebSocket text frame carries exactly one event encoded as JSON:
//! `{"event": "<name>", "data": <payload>}`. Clients send [`ClientEvent`]s
//! and the relay answers with [`ServerEvent`]s.

use serde::{Deserialize, Serialize};

/// Error type for event encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Events sent from a client to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Change the sender's nickname.
    SetNickname(String),

    /// Publish a chat message.
    Message {
        /// Nickname the client believes it has. The relay attributes the
        /// message to the connection's registered nickname regardless.
        nickname: String,
        /// Message body.
        #[serde(rename = "chatMessage")]
        chat_message: String,
    },

    /// Leave the chat. Equivalent to closing the socket.
    Disconnect,
}

/// Events sent from the relay to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// First event on every connection: the assigned nickname and the
    /// rendered history.
    Start {
        /// Nickname assigned to this connection.
        nickname: String,
        /// All stored messages, rendered, oldest first.
        #[serde(rename = "messageHistory")]
        message_history: Vec<String>,
    },

    /// A rendered chat line or a system notice.
    Message(String),

    /// Current participant list, in join order.
    OnlineUsers(Vec<String>),
}

/// Encodes a [`ServerEvent`] into a JSON text frame payload.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the event cannot be serialized.
pub fn encode(event: &ServerEvent) -> Result<String, CodecError> {
    serde_json::to_string(event).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a [`ClientEvent`] from a JSON text frame payload.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the text is not a known event.
pub fn decode(text: &str) -> Result<ClientEvent, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Encodes a [`ClientEvent`]. Used by clients and tests.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the event cannot be serialized.
pub fn encode_client(event: &ClientEvent) -> Result<String, CodecError> {
    serde_json::to_string(event).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a [`ServerEvent`]. Used by clients and tests.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the text is not a known event.
pub fn decode_server(text: &str) -> Result<ServerEvent, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Serialization(e.to_string()))
}
