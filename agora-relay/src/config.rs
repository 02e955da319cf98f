//! Relay settings.
//!
//! Each setting is taken from the first source that has it: command line
//! (or its environment variable), then `~/.config/agora-relay/config.toml`,
//! then the built-in default.
//!
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0:3000"
//! max_message_size = 16384
//! log_level = "info"
//!
//! [history]
//! file = "/var/lib/agora/chat.jsonl"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Default inbound frame limit in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid relay config: {0}")]
    ParseToml(#[from] toml::de::Error),
}

/// On-disk form. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    server: ServerSection,
    history: HistorySection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerSection {
    bind_addr: Option<String>,
    max_message_size: Option<usize>,
    log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistorySection {
    file: Option<PathBuf>,
}

/// Command line of `agora-relay`.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Agora chat relay")]
pub struct RelayCliArgs {
    /// Listen address.
    #[arg(short, long, env = "RELAY_ADDR")]
    pub bind: Option<String>,

    /// Config file to read instead of the default location.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Frames longer than this many bytes are dropped.
    #[arg(long)]
    pub max_message_size: Option<usize>,

    /// JSON-lines file chat history is persisted to. History is kept in
    /// memory only when unset.
    #[arg(long, env = "RELAY_HISTORY_FILE")]
    pub history_file: Option<PathBuf>,

    /// Tracing filter, e.g. `info` or `agora_relay=debug`.
    #[arg(long, env = "RELAY_LOG")]
    pub log_level: Option<String>,
}

/// Settings the relay runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind_addr: String,
    pub max_message_size: usize,
    /// `None` keeps history in memory.
    pub history_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            history_file: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl RelayConfig {
    /// Reads the config file and merges it under the command line.
    ///
    /// A file named with `--config` must exist; the default file may be
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a file exists but cannot be read or parsed,
    /// or if the `--config` file is missing.
    pub fn load(cli: &RelayCliArgs) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => read_settings(path)?,
            None => match default_path() {
                Some(path) if path.exists() => read_settings(&path)?,
                _ => FileSettings::default(),
            },
        };
        Ok(Self::merge(cli, file))
    }

    fn merge(cli: &RelayCliArgs, file: FileSettings) -> Self {
        let FileSettings { server, history } = file;
        let defaults = Self::default();
        Self {
            bind_addr: cli
                .bind
                .clone()
                .or(server.bind_addr)
                .unwrap_or(defaults.bind_addr),
            max_message_size: cli
                .max_message_size
                .or(server.max_message_size)
                .unwrap_or(defaults.max_message_size),
            history_file: cli.history_file.clone().or(history.file),
            log_level: cli
                .log_level
                .clone()
                .or(server.log_level)
                .unwrap_or(defaults.log_level),
        }
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("agora-relay").join("config.toml"))
}

fn read_settings(path: &Path) -> Result<FileSettings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}
