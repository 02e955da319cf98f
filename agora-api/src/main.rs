//! Agora HTTP services.
//!
//! One binary, one service per run, chosen by subcommand.
//!
//! # Usage
//!
//! ```bash
//! # Products and sales on 0.0.0.0:3000
//! cargo run --bin agora-api -- inventory
//!
//! # Talker API over a custom data file
//! cargo run --bin agora-api -- talker --talker-file ./talker.json
//!
//! # Cookbook API with a real secret and a log file
//! JWT_SECRET=change-me cargo run --bin agora-api -- cookbook --log-file /tmp/cookbook.log
//! ```

use std::path::Path;
use std::sync::Arc;

use agora_api::config::{ApiCliArgs, ApiConfig, Service};
use agora_api::cookbook::{self, CookbookState, auth::JwtKeys};
use agora_api::inventory::{self, InventoryState};
use agora_api::server;
use agora_api::talker::{self, TalkerState, store::TalkerStore};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    let cli = ApiCliArgs::parse();

    let config = match ApiConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&config.log_level, config.log_file.as_deref());

    tracing::info!(service = %config.service, addr = %config.bind_addr, "starting agora api");

    let app = match build_router(&config).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialise service");
            std::process::exit(1);
        }
    };

    match server::start_server(&config.bind_addr, app).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, service = %config.service, "api listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "api server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start api server");
            std::process::exit(1);
        }
    }
}

async fn build_router(
    config: &ApiConfig,
) -> Result<axum::Router, Box<dyn std::error::Error + Send + Sync>> {
    let app = match config.service {
        Service::Inventory => inventory::router(Arc::new(InventoryState::new())),
        Service::Talker => {
            let store = TalkerStore::new(&config.talker_file);
            // Fail fast on an unreadable data file.
            let count = store.all().await?.len();
            tracing::info!(path = %config.talker_file.display(), count, "talker data loaded");
            talker::router(Arc::new(TalkerState::new(store)))
        }
        Service::Cookbook => {
            if config.uses_default_secret() {
                tracing::warn!("JWT secret not configured, using the development default");
            }
            let keys = JwtKeys::new(&config.jwt_secret, config.token_ttl_hours);
            let state = CookbookState::new(keys, &config.uploads_dir);
            if let Some(seed) = &config.admin_seed {
                state.seed_admin(seed).await?;
            }
            cookbook::router(Arc::new(state))
        }
    };
    Ok(app)
}

/// Logs to stdout, or to `file_path` when given.
///
/// The returned [`WorkerGuard`] must be held until shutdown so buffered file
/// output is flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some((log_dir, file_name)) = file_path.and_then(|p| Some((p.parent()?, p.file_name()?)))
    else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        return None;
    };

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
