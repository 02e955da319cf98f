//! Agora HTTP services library.
//!
//! Three independent axum services share this crate: the inventory API
//! (products and sales), the talker API (a flat JSON file of speakers) and
//! the cookbook API (users, recipes, JWT auth and image upload). Each
//! service module exposes a `router` built from its own state; `main.rs`
//! picks one and serves it.

pub mod config;
pub mod cookbook;
pub mod db;
pub mod inventory;
pub mod server;
pub mod talker;
