//! kampus - student session cache and record viewer
//!
//! This library provides the pieces behind the `kampus` binary: a
//! single-slot session cache over a local key-value store, an identity
//! provider abstraction with a Firebase Authentication client, a document
//! store abstraction with a Firestore client, and the resolution protocol
//! that ties them together into "show the current student's record".
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `kv`: Key-value storage capability (sled, with an in-memory fallback)
//! - `session`: Session cache and login/logout flows
//! - `auth`: Identity provider abstraction and implementations
//! - `documents`: Document store abstraction and implementations
//! - `student`: Student record model and field normalization
//! - `resolver`: Resolution protocol and record view state
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Command handlers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use kampus::auth::{FakeIdentityProvider, Identity};
//! use kampus::config::ResolverConfig;
//! use kampus::documents::InMemoryDocumentStore;
//! use kampus::kv::MemoryStore;
//! use kampus::resolver::{Resolution, SessionResolver};
//! use kampus::session::{SessionManager, SessionStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let sessions = Arc::new(SessionStore::new(Arc::new(MemoryStore::new())));
//!     let provider = Arc::new(FakeIdentityProvider::new().with_account(
//!         "budi@x.com",
//!         "secret",
//!         Identity::new("u1"),
//!     ));
//!     let documents = Arc::new(InMemoryDocumentStore::new().with_document(
//!         "mahasiswa",
//!         "u1",
//!         json!({"nama": "Budi", "nim": "123", "jurusan": "TI", "angkatan": "2023"}),
//!     ));
//!
//!     SessionManager::new(sessions.clone(), provider.clone())
//!         .login("budi@x.com", "secret")
//!         .await?;
//!
//!     let resolver = SessionResolver::new(sessions, provider, documents, ResolverConfig::default());
//!     let resolution = resolver.resolve().await;
//!     assert_eq!(resolution.record().and_then(|r| r.angkatan), Some(2023));
//!     assert!(matches!(resolution, Resolution::Ready { .. }));
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod documents;
pub mod error;
pub mod kv;
pub mod resolver;
pub mod session;
pub mod student;

// Re-export commonly used types
pub use config::Config;
pub use error::{KampusError, Result};
pub use resolver::{Resolution, SessionResolver, StudentView};
pub use session::{SessionManager, SessionRecord, SessionStore};
