//! Chat history store.
//!
//! The [`MessageStore`] keeps every chat message in memory, oldest first.
//! When opened on a file, each new message is also appended to it as one
//! JSON line, and the file is replayed on startup so history survives
//! restarts.

use std::path::{Path, PathBuf};

use agora_proto::chat::ChatMessage;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Errors raised by the history store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or appending the history file failed.
    #[error("history file {path}: {source}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A line of the history file is not a valid message.
    #[error("history file line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append-only chat history.
#[derive(Default)]
pub struct MessageStore {
    messages: RwLock<Vec<ChatMessage>>,
    history_file: Option<PathBuf>,
}

impl MessageStore {
    /// Creates an empty, memory-only store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store backed by a JSON-lines file, loading whatever it
    /// already holds. A missing file is treated as empty history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Parse`] if a line is not a valid message.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let mut messages = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let msg = serde_json::from_str(line).map_err(|source| StoreError::Parse {
                line: idx + 1,
                source,
            })?;
            messages.push(msg);
        }

        tracing::info!(path = %path.display(), count = messages.len(), "chat history loaded");

        Ok(Self {
            messages: RwLock::new(messages),
            history_file: Some(path),
        })
    }

    /// Persists a message and returns it.
    ///
    /// The in-memory list is only extended once the file append succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the message cannot be written to the
    /// history file.
    pub async fn create(&self, message: ChatMessage) -> Result<ChatMessage, StoreError> {
        let mut messages = self.messages.write().await;
        if let Some(path) = &self.history_file {
            let mut line = serde_json::to_string(&message)?;
            line.push('\n');
            append_line(path, &line).await?;
        }
        messages.push(message.clone());
        drop(messages);
        Ok(message)
    }

    /// Returns the full history, oldest first.
    pub async fn all(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }

    /// Number of stored messages.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Returns `true` when no message has been stored.
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

async fn append_line(path: &Path, line: &str) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(io_err)?;
    file.write_all(line.as_bytes()).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)
}
