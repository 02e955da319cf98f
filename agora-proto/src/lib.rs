//! Shared protocol definitions for the Agora chat relay.

pub mod chat;
pub mod events;
