//! Agora chat relay -- real-time chat over WebSocket.
//!
//! An axum WebSocket server that tracks connected participants by nickname,
//! stores chat history, and broadcasts messages and the participant list to
//! every client.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:3000 with in-memory history
//! cargo run --bin agora-relay
//!
//! # Persist history and bind elsewhere
//! cargo run --bin agora-relay -- --bind 127.0.0.1:8080 --history-file chat.jsonl
//! ```

use std::sync::Arc;

use agora_relay::config::{RelayCliArgs, RelayConfig};
use agora_relay::relay::{self, RelayState};
use agora_relay::store::MessageStore;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = RelayCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match RelayConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting agora relay");

    let store = match &config.history_file {
        Some(path) => match MessageStore::open(path).await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!(error = %e, "failed to open chat history");
                std::process::exit(1);
            }
        },
        None => MessageStore::new(),
    };
    let state = Arc::new(RelayState::with_config(config.max_message_size, store));

    match relay::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "relay listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "relay server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start relay server");
            std::process::exit(1);
        }
    }
}
