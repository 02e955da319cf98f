//! Participant registry for the chat relay.
//!
//! Holds the nicknames of every open connection, in join order. The list is
//! what `onlineUsers` broadcasts carry. Nicknames are not unique: two
//! connections may share one, and rename/remove operate on the string, not
//! on the connection.
//!
//! Entries are ephemeral and lost on relay restart.

use parking_lot::Mutex;

/// In-memory list of connected participants' nicknames.
///
/// Every operation takes the lock for its own duration only; none of them
/// report errors. Renaming or removing an absent nickname is a no-op.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    participants: Mutex<Vec<String>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a participant. Duplicates are accepted.
    pub fn add(&self, nickname: &str) {
        self.participants.lock().push(nickname.to_string());
    }

    /// Replaces the first entry equal to `old` with `new`.
    ///
    /// Returns `true` if an entry was replaced.
    pub fn rename(&self, old: &str, new: &str) -> bool {
        let mut participants = self.participants.lock();
        participants
            .iter_mut()
            .find(|name| name.as_str() == old)
            .map(|name| new.clone_into(name))
            .is_some()
    }

    /// Removes every entry equal to `nickname`, returning how many were removed.
    pub fn remove(&self, nickname: &str) -> usize {
        let mut participants = self.participants.lock();
        let before = participants.len();
        participants.retain(|name| name != nickname);
        before - participants.len()
    }

    /// Snapshot of the participant list in join order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.participants.lock().clone()
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.lock().len()
    }

    /// Returns `true` when nobody is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.lock().is_empty()
    }
}
