//! Chat message model and its display rendering.
//!
//! A [`ChatMessage`] is what the relay persists for every inbound `message`
//! event. Clients never see the struct itself: history and live messages are
//! both delivered as the string produced by [`ChatMessage::render`].

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in rendered messages, e.g. `19-10-2026 03:04:05 PM`.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %I:%M:%S %p";

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message body as typed by the participant.
    pub message: String,
    /// Nickname the message is attributed to.
    pub nickname: String,
    /// Creation time, already formatted with [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
}

impl ChatMessage {
    /// Creates a message stamped with the current local time.
    #[must_use]
    pub fn new(nickname: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at(nickname, message, Local::now())
    }

    /// Creates a message stamped with the given time.
    #[must_use]
    pub fn at(
        nickname: impl Into<String>,
        message: impl Into<String>,
        time: DateTime<Local>,
    ) -> Self {
        Self {
            message: message.into(),
            nickname: nickname.into(),
            timestamp: format_timestamp(&time),
        }
    }

    /// Renders the message into the display form broadcast to clients:
    /// `"<timestamp> - <nickname>: <message>"`.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{} - {}: {}", self.timestamp, self.nickname, self.message)
    }
}

/// Formats a time the way chat timestamps are displayed.
#[must_use]
pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// System message announcing a nickname change.
#[must_use]
pub fn rename_notice(old: &str, new: &str) -> String {
    format!("{old} changed their nickname to {new}")
}

/// System message announcing that a participant left.
#[must_use]
pub fn departure_notice(nickname: &str) -> String {
    format!("{nickname} left the room")
}
