//! Document store abstraction
//!
//! Student data lives in a remote document database. The only read this
//! crate ever issues is a point read of one document by its key; there is
//! no operation that lists or scans a collection.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreClient;
pub use memory::InMemoryDocumentStore;

/// Client for a remote document database.
///
/// # Examples
///
/// ```
/// use kampus::documents::{DocumentStore, InMemoryDocumentStore};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> kampus::error::Result<()> {
/// let store = InMemoryDocumentStore::new()
///     .with_document("mahasiswa", "u1", json!({"nama": "Budi"}));
///
/// assert!(store.get_by_key("mahasiswa", "u1").await?.is_some());
/// assert!(store.get_by_key("mahasiswa", "u2").await?.is_none());
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads the single document `collection/key`.
    ///
    /// Returns `Ok(None)` when the document does not exist. The document's
    /// fields are returned as a plain JSON object.
    ///
    /// # Errors
    ///
    /// Returns `KampusError::Fetch` (or a transport error) when the read
    /// itself fails.
    async fn get_by_key(&self, collection: &str, key: &str) -> Result<Option<Value>>;
}
