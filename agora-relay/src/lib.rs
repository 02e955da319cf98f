//! Agora chat relay library.
//!
//! Exposes the relay server for use in tests and embedding.
//! The relay accepts WebSocket connections, tracks participants by
//! nickname, persists chat history, and fans events out to every
//! connected client.

pub mod config;
pub mod connection;
pub mod registry;
pub mod relay;
pub mod store;
