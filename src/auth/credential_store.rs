//! Signed-in credential persistence via OS keyring
//!
//! The identity provider's own state (refresh token plus the user profile it
//! belongs to) must survive a restart, the same way a mobile SDK keeps its
//! auth state on the device. It is stored in the operating system's native
//! credential store (Keychain on macOS, Secret Service on Linux, Windows
//! Credential Manager on Windows), serialized as JSON.
//!
//! This is separate from the session cache in [`crate::session`]: the
//! keyring entry belongs to the provider client, the session cache belongs to
//! the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::{KampusError, Result};

/// Keyring account name under which the credential is stored.
const ACCOUNT: &str = "current-user";

/// Provider credential persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    /// The user the refresh token belongs to
    pub identity: Identity,

    /// Long-lived token exchanged for fresh ID tokens
    pub refresh_token: String,

    /// When the credential was issued
    #[serde(with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
}

/// Namespaced accessor for the OS native keyring.
///
/// Each Firebase project gets its own service name so switching projects
/// never picks up a credential from another one.
///
/// # Examples
///
/// ```no_run
/// use chrono::Utc;
/// use kampus::auth::{CredentialStore, Identity, StoredCredential};
///
/// # fn main() -> kampus::error::Result<()> {
/// let store = CredentialStore::new("my-project");
/// store.save(&StoredCredential {
///     identity: Identity::new("u1"),
///     refresh_token: "refresh".to_string(),
///     issued_at: Utc::now(),
/// })?;
/// assert!(store.load()?.is_some());
/// store.delete()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CredentialStore {
    service: String,
}

impl CredentialStore {
    /// Creates an accessor scoped to `project_id`.
    pub fn new(project_id: &str) -> Self {
        Self {
            service: Self::service_name(project_id),
        }
    }

    /// Builds the keyring service name for a Firebase project.
    fn service_name(project_id: &str) -> String {
        format!("kampus-firebase-{}", project_id)
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, ACCOUNT).map_err(|e| KampusError::Keyring(e).into())
    }

    /// Persists `credential`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`KampusError::Serialization`] if JSON serialization fails or
    /// [`KampusError::Keyring`] if the OS credential store rejects the write.
    pub fn save(&self, credential: &StoredCredential) -> Result<()> {
        let json_str = serde_json::to_string(credential).map_err(KampusError::Serialization)?;
        self.entry()?
            .set_password(&json_str)
            .map_err(KampusError::Keyring)?;
        Ok(())
    }

    /// Loads the stored credential.
    ///
    /// Returns `Ok(None)` when nothing has been saved.
    ///
    /// # Errors
    ///
    /// Returns [`KampusError::Keyring`] on an unexpected keyring error, or
    /// [`KampusError::Serialization`] if the stored JSON is malformed.
    pub fn load(&self) -> Result<Option<StoredCredential>> {
        match self.entry()?.get_password() {
            Ok(json_str) => {
                let credential: StoredCredential =
                    serde_json::from_str(&json_str).map_err(KampusError::Serialization)?;
                Ok(Some(credential))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KampusError::Keyring(e).into()),
        }
    }

    /// Deletes the stored credential. A no-op when none exists.
    pub fn delete(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KampusError::Keyring(e).into()),
        }
    }
}
