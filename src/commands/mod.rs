//! Command handlers for kampus
//!
//! Each subcommand builds an [`AppContext`] from configuration and then runs
//! against it. The context owns one instance of every collaborator so the
//! session cache, identity provider, and document store are shared by the
//! login flow and the resolver within a process.

use std::sync::Arc;

use crate::auth::{AccessTokenSource, FirebaseAuth, IdentityProvider};
use crate::config::{Config, StorageBackend};
use crate::documents::{DocumentStore, FirestoreClient};
use crate::error::Result;
use crate::kv::{self, KeyValueStore, MemoryStore};
use crate::resolver::SessionResolver;
use crate::session::{SessionManager, SessionStore};

pub mod password;
pub mod profile;
pub mod session;
pub mod shell;
pub mod shell_commands;

/// Everything a command needs, wired once per process.
pub struct AppContext {
    /// Identity provider shared by login and resolution
    pub provider: Arc<dyn IdentityProvider>,
    /// Session cache
    pub sessions: Arc<SessionStore>,
    /// Login and logout flows
    pub manager: SessionManager,
    /// Resolution protocol
    pub resolver: Arc<SessionResolver>,
}

impl AppContext {
    /// Wires the Firebase-backed collaborators described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the Firebase settings are incomplete or an
    /// HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate_remote()?;

        let kv = open_storage(config)?;
        let auth = Arc::new(FirebaseAuth::new(&config.firebase)?);
        let tokens: Arc<dyn AccessTokenSource> = auth.clone();
        let documents = Arc::new(FirestoreClient::new(&config.firebase, Some(tokens))?);

        Ok(Self::with_parts(config, kv, auth, documents))
    }

    /// Wires a context from already-built collaborators.
    pub fn with_parts(
        config: &Config,
        kv: Arc<dyn KeyValueStore>,
        provider: Arc<dyn IdentityProvider>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(kv));
        let manager = SessionManager::new(sessions.clone(), provider.clone());
        let resolver = Arc::new(SessionResolver::new(
            sessions.clone(),
            provider.clone(),
            documents,
            config.resolver.clone(),
        ));

        Self {
            provider,
            sessions,
            manager,
            resolver,
        }
    }
}

fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory session storage");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Sled => {
            let path = config.storage.resolve_path()?;
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!(path = %parent.display(), error = %e, "Could not create storage directory");
                }
            }
            Ok(kv::open_with_fallback(path))
        }
    }
}
