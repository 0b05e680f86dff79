//! In-memory key-value store

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{KampusError, Result};
use crate::kv::KeyValueStore;

/// Non-durable [`KeyValueStore`] backed by a `HashMap`.
///
/// Used as the degraded fallback when the on-disk engine cannot be opened,
/// and directly in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> anyhow::Error {
    KampusError::Storage("memory store lock poisoned".to_string()).into()
}

impl KeyValueStore for MemoryStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn clear_all(&self) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.clear();
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("user", "{}").unwrap();
        assert_eq!(store.get_string("user").unwrap(), Some("{}".to_string()));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get_string("missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.set("user", "x").unwrap();
        store.delete("user").unwrap();
        store.delete("user").unwrap();
        assert!(store.get_string("user").unwrap().is_none());
    }

    #[test]
    fn test_keys_are_sorted() {
        let store = MemoryStore::new();
        store.set("b", "2").unwrap();
        store.set("a", "1").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_clear_all_removes_everything() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.clear_all().unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_is_not_durable() {
        assert!(!MemoryStore::new().is_durable());
    }
}
