//! Cache storage abstraction: named generations of URL → response entries.
//!
//! A generation is one versioned snapshot of the offline asset cache. The
//! platform contract is weak on purpose: individual entry writes are
//! atomic, multi-entry consistency is not, and callers must tolerate a
//! generation observed in a partially-updated state.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::http::Response;

/// A captured response plus bookkeeping, as stored inside a generation.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The captured response.
    pub response: Response,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl Entry {
    /// Wraps a response with the current timestamp.
    #[must_use]
    pub fn new(response: Response) -> Self {
        Self {
            response,
            stored_at: Utc::now(),
        }
    }
}

/// Abstraction over cache storage for testability.
///
/// Mirrors the platform surface the shell worker relies on: open a named
/// cache, match a URL, overwrite an entry, enumerate generation names,
/// delete a generation wholesale.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Opens the named generation, creating it if absent.
    async fn open(&self, generation: &str) -> Result<()>;

    /// Looks up a URL within a generation.
    async fn lookup(&self, generation: &str, url: &str) -> Result<Option<Entry>>;

    /// Stores a response under a URL, overwriting any prior entry.
    /// Last writer wins when two refreshes race on the same URL.
    async fn put(&self, generation: &str, url: &str, response: Response) -> Result<()>;

    /// Names of every generation currently in storage.
    async fn generations(&self) -> Result<Vec<String>>;

    /// Deletes a whole generation. Destructive and irreversible.
    /// Returns whether the generation existed.
    async fn delete(&self, generation: &str) -> Result<bool>;
}

/// In-memory cache store, the default backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    generations: RwLock<HashMap<String, HashMap<String, Entry>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a generation, zero if it does not exist.
    pub async fn len(&self, generation: &str) -> usize {
        self.generations
            .read()
            .await
            .get(generation)
            .map_or(0, HashMap::len)
    }

    /// Returns true if the named generation holds no entries.
    pub async fn is_empty(&self, generation: &str) -> bool {
        self.len(generation).await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, generation: &str) -> Result<()> {
        self.generations
            .write()
            .await
            .entry(generation.to_string())
            .or_default();
        Ok(())
    }

    async fn lookup(&self, generation: &str, url: &str) -> Result<Option<Entry>> {
        Ok(self
            .generations
            .read()
            .await
            .get(generation)
            .and_then(|entries| entries.get(url))
            .cloned())
    }

    async fn put(&self, generation: &str, url: &str, response: Response) -> Result<()> {
        self.generations
            .write()
            .await
            .entry(generation.to_string())
            .or_default()
            .insert(url.to_string(), Entry::new(response));
        Ok(())
    }

    async fn generations(&self) -> Result<Vec<String>> {
        Ok(self.generations.read().await.keys().cloned().collect())
    }

    async fn delete(&self, generation: &str) -> Result<bool> {
        Ok(self.generations.write().await.remove(generation).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_empty_generation() {
        let store = MemoryStore::new();
        store.open("shell-v1").await.unwrap();

        assert_eq!(store.generations().await.unwrap(), vec!["shell-v1"]);
        assert!(store.is_empty("shell-v1").await);
    }

    #[tokio::test]
    async fn put_then_lookup_round_trips() {
        let store = MemoryStore::new();
        store
            .put("shell-v1", "/index.html", Response::new(200, "<html>"))
            .await
            .unwrap();

        let entry = store.lookup("shell-v1", "/index.html").await.unwrap();
        let entry = entry.expect("entry present");
        assert_eq!(entry.response.status, 200);
        assert_eq!(entry.response.body.as_ref(), b"<html>");
    }

    #[tokio::test]
    async fn lookup_misses_on_unknown_generation_and_url() {
        let store = MemoryStore::new();
        store.open("shell-v1").await.unwrap();

        assert!(store.lookup("shell-v1", "/nope").await.unwrap().is_none());
        assert!(store.lookup("shell-v9", "/nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_overwrites_prior_entry() {
        let store = MemoryStore::new();
        store
            .put("shell-v1", "/app.js", Response::new(200, "old"))
            .await
            .unwrap();
        store
            .put("shell-v1", "/app.js", Response::new(200, "new"))
            .await
            .unwrap();

        let entry = store.lookup("shell-v1", "/app.js").await.unwrap().unwrap();
        assert_eq!(entry.response.body.as_ref(), b"new");
        assert_eq!(store.len("shell-v1").await, 1);
    }

    #[tokio::test]
    async fn delete_removes_generation() {
        let store = MemoryStore::new();
        store.open("shell-v1").await.unwrap();
        store.open("shell-v2").await.unwrap();

        assert!(store.delete("shell-v1").await.unwrap());
        assert!(!store.delete("shell-v1").await.unwrap());
        assert_eq!(store.generations().await.unwrap(), vec!["shell-v2"]);
    }
}
