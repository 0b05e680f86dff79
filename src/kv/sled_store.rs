//! Durable key-value store on an embedded `sled` database

use std::path::Path;

use sled::Db;

use crate::error::{KampusError, Result};
use crate::kv::KeyValueStore;

/// Durable [`KeyValueStore`] backed by `sled`.
///
/// Every mutating call flushes before returning so that a write which
/// returned `Ok` survives an abrupt process exit.
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create a store at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the database directory
    ///
    /// # Errors
    ///
    /// Returns `KampusError::Storage` if the database cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use kampus::kv::{KeyValueStore, SledStore};
    ///
    /// # fn main() -> kampus::error::Result<()> {
    /// let dir = tempfile::tempdir()?;
    /// let store = SledStore::open(dir.path().join("session.sled"))?;
    /// store.set("user", "{}")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| KampusError::Storage(format!("Failed to open database: {}", e)))?;
        Ok(Self { db })
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| KampusError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

impl KeyValueStore for SledStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| KampusError::Storage(format!("Insert failed: {}", e)))?;
        self.flush()
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| KampusError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let value = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    KampusError::Storage(format!("Value for {} is not UTF-8: {}", key, e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| KampusError::Storage(format!("Remove failed: {}", e)))?;
        self.flush()
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for result in self.db.iter().keys() {
            let key =
                result.map_err(|e| KampusError::Storage(format!("Iteration failed: {}", e)))?;
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(keys)
    }

    fn clear_all(&self) -> Result<()> {
        self.db
            .clear()
            .map_err(|e| KampusError::Storage(format!("Clear failed: {}", e)))?;
        self.flush()
    }

    fn is_durable(&self) -> bool {
        true
    }
}
