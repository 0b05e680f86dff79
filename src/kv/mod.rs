//! Local key-value persistence
//!
//! The [`KeyValueStore`] trait is the capability the session store is built
//! on: durable string get/set/delete plus bulk key listing and clearing.
//! Two engines implement it:
//!
//! - [`SledStore`] -- durable, embedded `sled` database on disk.
//! - [`MemoryStore`] -- process-local map used when the durable engine cannot
//!   be opened. Data is lost on restart.
//!
//! [`open_with_fallback`] picks between them once at process start; the
//! resulting handle is injected wherever persistence is needed.

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

pub mod memory;
pub mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

/// String key-value storage capability.
///
/// Implementations must be safe to share across tasks. Every method is
/// synchronous from the caller's point of view: once `set` or `delete`
/// returns `Ok`, a subsequent `get_string` observes the change.
pub trait KeyValueStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Returns the value stored under `key`, or `None` when absent.
    fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Removes `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Lists every key currently stored.
    fn keys(&self) -> Result<Vec<String>>;

    /// Removes every key.
    fn clear_all(&self) -> Result<()>;

    /// Whether data written to this store survives a process restart.
    fn is_durable(&self) -> bool;
}

/// Opens the durable engine at `path`, falling back to memory on failure.
///
/// The fallback is logged at warn level; callers receive a working store
/// either way.
///
/// # Examples
///
/// ```
/// use kampus::kv::open_with_fallback;
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = open_with_fallback(dir.path().join("session.sled"));
/// assert!(store.is_durable());
/// ```
pub fn open_with_fallback(path: impl AsRef<Path>) -> Arc<dyn KeyValueStore> {
    let path = path.as_ref();
    match SledStore::open(path) {
        Ok(store) => {
            tracing::info!(path = %path.display(), "Session storage initialized");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Durable storage unavailable, using in-memory fallback"
            );
            Arc::new(MemoryStore::new())
        }
    }
}
