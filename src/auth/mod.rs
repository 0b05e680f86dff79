//! Identity provider abstraction
//!
//! The identity provider owns credential verification and the "who is signed
//! in right now" state. This crate never verifies passwords itself; it talks
//! to a provider through [`IdentityProvider`].
//!
//! - [`firebase::FirebaseAuth`] -- Firebase Authentication over its REST API,
//!   with the signed-in credential persisted in the OS keyring.
//! - [`fake::FakeIdentityProvider`] -- in-process provider for tests and
//!   offline runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::Result;

pub mod credential_store;
pub mod fake;
pub mod firebase;

pub use credential_store::{CredentialStore, StoredCredential};
pub use fake::FakeIdentityProvider;
pub use firebase::FirebaseAuth;

/// A user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable provider-issued identifier
    pub uid: String,
    /// Email address, if the account has one
    pub email: Option<String>,
    /// Display name, if the account has one
    pub display_name: Option<String>,
}

impl Identity {
    /// Creates an identity with only a uid.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Client for an external identity provider.
///
/// # Examples
///
/// ```
/// use kampus::auth::{FakeIdentityProvider, Identity, IdentityProvider};
///
/// # #[tokio::main]
/// # async fn main() -> kampus::error::Result<()> {
/// let provider = FakeIdentityProvider::new()
///     .with_account("a@x.com", "secret", Identity::new("u1").with_email("a@x.com"));
///
/// let identity = provider.sign_in("a@x.com", "secret").await?;
/// assert_eq!(identity.uid, "u1");
/// assert_eq!(provider.current_identity().await.map(|i| i.uid), Some("u1".to_string()));
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies email/password credentials and makes that user current.
    ///
    /// # Errors
    ///
    /// Returns `KampusError::Authentication` when the provider rejects the
    /// credentials, or a transport error when it cannot be reached.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    /// The provider's live current user, if any.
    async fn current_identity(&self) -> Option<Identity>;

    /// Receiver that observes every sign-in and sign-out.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

    /// Signs the current user out. Signing out twice is not an error.
    async fn sign_out(&self) -> Result<()>;
}

/// Supplies bearer tokens for document store requests.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// A currently valid access token, or `None` when nobody is signed in.
    async fn access_token(&self) -> Result<Option<String>>;
}
