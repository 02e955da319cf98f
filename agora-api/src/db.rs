//! In-process document collections.
//!
//! A [`Collection`] stores documents of one type in insertion order and is
//! the data-access layer every service builds on. Documents are addressed by
//! [`DocId`], a 24-character lowercase hex identifier.

use std::fmt::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Length of a document identifier in hex characters.
pub const DOC_ID_LEN: usize = 24;

/// A string that is not a well-formed [`DocId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid document id: {0:?}")]
pub struct InvalidDocId(pub String);

/// Document identifier: 12 bytes rendered as 24 lowercase hex characters.
///
/// Fresh ids start with a millisecond timestamp, so ids created later sort
/// after ids created earlier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocId(String);

impl DocId {
    /// Generates a new identifier.
    #[must_use]
    pub fn new() -> Self {
        let bytes = Uuid::now_v7().into_bytes();
        let mut hex = String::with_capacity(DOC_ID_LEN);
        for byte in &bytes[..DOC_ID_LEN / 2] {
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// Returns `true` if `s` is a well-formed identifier (case-insensitive).
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        s.len() == DOC_ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for DocId {
    type Err = InvalidDocId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(InvalidDocId(s.to_string()))
        }
    }
}

impl TryFrom<String> for DocId {
    type Error = InvalidDocId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocId> for String {
    fn from(id: DocId) -> Self {
        id.0
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value stored in a [`Collection`].
pub trait Document: Clone + Send + Sync + 'static {
    /// The document's identifier.
    fn id(&self) -> &DocId;
}

/// Thread-safe, insertion-ordered set of documents of one type.
pub struct Collection<T> {
    name: &'static str,
    docs: RwLock<Vec<T>>,
}

impl<T: Document> Collection<T> {
    /// Creates an empty collection. `name` is only used in logs.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            docs: RwLock::new(Vec::new()),
        }
    }

    /// The collection name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Stores a document and returns it.
    pub async fn insert(&self, doc: T) -> T {
        let mut docs = self.docs.write().await;
        docs.push(doc.clone());
        tracing::debug!(collection = self.name, id = %doc.id(), "document inserted");
        doc
    }

    /// All documents in insertion order.
    pub async fn find_all(&self) -> Vec<T> {
        self.docs.read().await.clone()
    }

    /// Looks a document up by id.
    pub async fn find_by_id(&self, id: &DocId) -> Option<T> {
        let docs = self.docs.read().await;
        docs.iter().find(|d| d.id() == id).cloned()
    }

    /// First document matching `pred`.
    pub async fn find_one(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let docs = self.docs.read().await;
        docs.iter().find(|d| pred(d)).cloned()
    }

    /// Applies `change` to the document with the given id and returns the
    /// updated document, or `None` if it does not exist.
    pub async fn update(&self, id: &DocId, change: impl FnOnce(&mut T)) -> Option<T> {
        let mut docs = self.docs.write().await;
        let doc = docs.iter_mut().find(|d| d.id() == id)?;
        change(doc);
        tracing::debug!(collection = self.name, id = %id, "document updated");
        Some(doc.clone())
    }

    /// Removes the document with the given id and returns it.
    pub async fn delete(&self, id: &DocId) -> Option<T> {
        let mut docs = self.docs.write().await;
        let idx = docs.iter().position(|d| d.id() == id)?;
        tracing::debug!(collection = self.name, id = %id, "document deleted");
        Some(docs.remove(idx))
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    /// Returns `true` when the collection is empty.
    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}
