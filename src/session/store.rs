use std::sync::{Arc, Mutex};

use crate::kv::KeyValueStore;
use crate::session::SessionRecord;

/// Key under which the session record is stored.
pub const SESSION_KEY: &str = "user";

/// Single-slot persistence of the current session's [`SessionRecord`].
///
/// `save` wipes the entire underlying store before writing, so nothing from
/// an earlier login can be read back once it returns. Failures are logged
/// rather than returned: a broken store degrades to "no session".
///
/// All three operations take the same lock, so a concurrent `load` never
/// lands between the wipe and the write of a `save`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use kampus::kv::MemoryStore;
/// use kampus::session::{SessionRecord, SessionStore};
///
/// let store = SessionStore::new(Arc::new(MemoryStore::new()));
/// let record = SessionRecord::new("u1", Some("a@x.com".to_string()), None).unwrap();
/// assert!(store.save(&record));
/// assert_eq!(store.load(), Some(record));
/// store.clear();
/// assert_eq!(store.load(), None);
/// ```
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    slot: Mutex<()>,
}

impl SessionStore {
    /// Creates a session store over an injected key-value engine.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            slot: Mutex::new(()),
        }
    }

    /// Replaces whatever is stored with `record`.
    ///
    /// Returns `true` when the record was written. On `false` the store may
    /// hold anything between "already wiped" and "unchanged"; there is no
    /// rollback.
    pub fn save(&self, record: &SessionRecord) -> bool {
        if let Err(e) = record.validate() {
            tracing::error!(error = %e, "Refusing to save session");
            return false;
        }

        let payload = match serde_json::to_string(record) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize session");
                return false;
            }
        };

        let _guard = self.slot.lock().unwrap_or_else(|p| p.into_inner());

        if let Err(e) = self.kv.clear_all() {
            tracing::error!(error = %e, "Failed to clear storage before saving session");
            return false;
        }
        if let Err(e) = self.kv.set(SESSION_KEY, &payload) {
            tracing::error!(error = %e, "Failed to save session");
            return false;
        }

        tracing::debug!(uid = %record.uid, "Session saved");
        true
    }

    /// Returns the stored record, or `None` when absent or unreadable.
    pub fn load(&self) -> Option<SessionRecord> {
        let _guard = self.slot.lock().unwrap_or_else(|p| p.into_inner());

        let json = match self.kv.get_string(SESSION_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read session");
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&json) {
            Ok(record) if record.validate().is_ok() => Some(record),
            Ok(_) => {
                tracing::warn!("Stored session has an empty uid, ignoring");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored session is malformed, ignoring");
                None
            }
        }
    }

    /// Removes the session entry. Clearing an empty store is a no-op.
    pub fn clear(&self) {
        let _guard = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = self.kv.delete(SESSION_KEY) {
            tracing::error!(error = %e, "Failed to clear session");
        }
    }

    /// Whether the backing engine survives restarts.
    pub fn is_durable(&self) -> bool {
        self.kv.is_durable()
    }
}
