//! In-memory document store for tests and offline runs

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::documents::DocumentStore;
use crate::error::{KampusError, Result};

/// [`DocumentStore`] holding documents in a map.
///
/// Supports failure injection ([`fail_next`](Self::fail_next)) and per-key
/// latency ([`set_latency`](Self::set_latency)) so callers can exercise
/// error paths and out-of-order completions. Every point read is counted.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<HashMap<(String, String), Value>>,
    failures: Mutex<VecDeque<String>>,
    latency: Mutex<HashMap<String, Duration>>,
    reads: AtomicUsize,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, builder style.
    pub fn with_document(self, collection: &str, key: &str, document: Value) -> Self {
        self.insert(collection, key, document);
        self
    }

    /// Adds or replaces a document.
    pub fn insert(&self, collection: &str, key: &str, document: Value) {
        let mut documents = self.documents.lock().unwrap_or_else(|p| p.into_inner());
        documents.insert((collection.to_string(), key.to_string()), document);
    }

    /// Removes a document.
    pub fn remove(&self, collection: &str, key: &str) {
        let mut documents = self.documents.lock().unwrap_or_else(|p| p.into_inner());
        documents.remove(&(collection.to_string(), key.to_string()));
    }

    /// Makes the next read fail with `message`. Calls queue up.
    pub fn fail_next(&self, message: &str) {
        let mut failures = self.failures.lock().unwrap_or_else(|p| p.into_inner());
        failures.push_back(message.to_string());
    }

    /// Delays every read of `key` by `delay`.
    pub fn set_latency(&self, key: &str, delay: Duration) {
        let mut latency = self.latency.lock().unwrap_or_else(|p| p.into_inner());
        latency.insert(key.to_string(), delay);
    }

    /// Number of point reads issued so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_by_key(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let delay = {
            let latency = self.latency.lock().unwrap_or_else(|p| p.into_inner());
            latency.get(key).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = {
            let mut failures = self.failures.lock().unwrap_or_else(|p| p.into_inner());
            failures.pop_front()
        };
        if let Some(message) = failure {
            return Err(KampusError::Fetch(message).into());
        }

        let documents = self.documents.lock().unwrap_or_else(|p| p.into_inner());
        Ok(documents
            .get(&(collection.to_string(), key.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_point_read_hits_only_the_requested_key() {
        let store = InMemoryDocumentStore::new()
            .with_document("mahasiswa", "u1", json!({"nama": "Budi"}))
            .with_document("mahasiswa", "u2", json!({"nama": "Sari"}));

        let doc = store.get_by_key("mahasiswa", "u2").await.unwrap().unwrap();
        assert_eq!(doc["nama"], "Sari");
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn test_collection_is_part_of_the_key() {
        let store = InMemoryDocumentStore::new().with_document("dosen", "u1", json!({}));
        assert!(store.get_by_key("mahasiswa", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fail_next_applies_once() {
        let store = InMemoryDocumentStore::new().with_document("mahasiswa", "u1", json!({}));
        store.fail_next("unavailable");

        assert!(store.get_by_key("mahasiswa", "u1").await.is_err());
        assert!(store.get_by_key("mahasiswa", "u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_document() {
        let store = InMemoryDocumentStore::new().with_document("mahasiswa", "u1", json!({}));
        store.remove("mahasiswa", "u1");
        assert!(store.get_by_key("mahasiswa", "u1").await.unwrap().is_none());
    }
}
