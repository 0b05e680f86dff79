use std::sync::Arc;

use crate::auth::{Identity, IdentityProvider};
use crate::error::Result;
use crate::session::{SessionRecord, SessionStore};

/// Login and logout flows.
///
/// Keeps the session cache in step with the identity provider: a successful
/// login writes the cache before anything else reads it, and logout signs out
/// of the provider and empties the cache.
pub struct SessionManager {
    sessions: Arc<SessionStore>,
    provider: Arc<dyn IdentityProvider>,
}

impl SessionManager {
    /// Creates a manager over the given cache and provider.
    pub fn new(sessions: Arc<SessionStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { sessions, provider }
    }

    /// Signs in and caches the resulting identity.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error when it rejects the credentials. The
    /// cache is left untouched in that case.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.provider.sign_in(email, password).await?;
        tracing::info!(uid = %identity.uid, "Signed in");

        if !self.sessions.save(&SessionRecord::from(&identity)) {
            tracing::warn!(uid = %identity.uid, "Signed in but the session could not be cached");
        }
        Ok(identity)
    }

    /// Signs out of the provider and clears the cache.
    ///
    /// The cache is cleared even when the provider fails to sign out.
    pub async fn logout(&self) {
        if let Err(e) = self.provider.sign_out().await {
            tracing::error!(error = %e, "Provider sign-out failed");
        }
        self.sessions.clear();
        tracing::info!("Signed out");
    }

    /// The cached session, falling back to the provider's live user.
    pub async fn current_user(&self) -> Option<SessionRecord> {
        if let Some(record) = self.sessions.load() {
            return Some(record);
        }
        self.provider
            .current_identity()
            .await
            .map(|identity| SessionRecord::from(&identity))
    }

    /// The session cache this manager writes to.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }
}
