//! Talker persistence: the whole list lives in one JSON file.
//!
//! Reads go straight to the file. Writes are read-modify-write cycles that
//! hold the store lock for their whole duration and replace the file through
//! a temporary sibling, so readers never observe a half-written array.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::error::TalkerError;

/// Talk details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talk {
    /// Date the talk was watched, `dd/mm/yyyy`.
    #[serde(rename = "watchedAt")]
    pub watched_at: String,
    /// Rating from 1 to 5.
    pub rate: u8,
}

/// A stored talker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talker {
    pub id: u64,
    pub name: String,
    pub age: u64,
    pub talk: Talk,
}

/// Talker fields without an id, as accepted on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTalker {
    pub name: String,
    pub age: u64,
    pub talk: Talk,
}

impl NewTalker {
    fn with_id(self, id: u64) -> Talker {
        Talker {
            id,
            name: self.name,
            age: self.age,
            talk: self.talk,
        }
    }
}

/// JSON-file backed talker list.
pub struct TalkerStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TalkerStore {
    /// Uses `path` as the data file. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every talker in file order. A missing file reads as an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`TalkerError::Storage`] or [`TalkerError::Corrupt`] if the
    /// file cannot be read or parsed.
    pub async fn all(&self) -> Result<Vec<Talker>, TalkerError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(TalkerError::Storage {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents).map_err(|source| TalkerError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Looks a talker up by id.
    ///
    /// # Errors
    ///
    /// Returns [`TalkerError::NotFound`] if absent, or a storage error.
    pub async fn get(&self, id: u64) -> Result<Talker, TalkerError> {
        self.all()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(TalkerError::NotFound)
    }

    /// Talkers whose name contains `term`, ignoring case. An empty term
    /// matches everyone.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read.
    pub async fn search(&self, term: &str) -> Result<Vec<Talker>, TalkerError> {
        let needle = term.to_lowercase();
        let mut talkers = self.all().await?;
        talkers.retain(|t| t.name.to_lowercase().contains(&needle));
        Ok(talkers)
    }

    /// Appends a talker with id one above the highest in use.
    ///
    /// # Errors
    ///
    /// Returns [`TalkerError::IdsExhausted`] if the highest id is
    /// `u64::MAX`, or a storage error if the file cannot be read or written.
    pub async fn create(&self, new: NewTalker) -> Result<Talker, TalkerError> {
        let _guard = self.write_lock.lock().await;
        let mut talkers = self.all().await?;
        let highest = talkers.iter().map(|t| t.id).max().unwrap_or(0);
        let id = highest
            .checked_add(1)
            .ok_or(TalkerError::IdsExhausted(highest))?;
        let talker = new.with_id(id);
        talkers.push(talker.clone());
        self.write_all(&talkers).await?;
        tracing::info!(id, name = %talker.name, "talker created");
        Ok(talker)
    }

    /// Replaces the talker with the given id, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`TalkerError::NotFound`] if absent, or a storage error.
    pub async fn replace(&self, id: u64, new: NewTalker) -> Result<Talker, TalkerError> {
        let _guard = self.write_lock.lock().await;
        let mut talkers = self.all().await?;
        let slot = talkers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TalkerError::NotFound)?;
        *slot = new.with_id(id);
        let talker = slot.clone();
        self.write_all(&talkers).await?;
        tracing::info!(id, "talker updated");
        Ok(talker)
    }

    /// Removes the talker with the given id. Returns `false` if there was
    /// none.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read or written.
    pub async fn remove(&self, id: u64) -> Result<bool, TalkerError> {
        let _guard = self.write_lock.lock().await;
        let mut talkers = self.all().await?;
        let before = talkers.len();
        talkers.retain(|t| t.id != id);
        if talkers.len() == before {
            return Ok(false);
        }
        self.write_all(&talkers).await?;
        tracing::info!(id, "talker deleted");
        Ok(true)
    }

    async fn write_all(&self, talkers: &[Talker]) -> Result<(), TalkerError> {
        let storage_err = |source| TalkerError::Storage {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_vec_pretty(talkers).map_err(|source| TalkerError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(storage_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(storage_err)
    }
}
