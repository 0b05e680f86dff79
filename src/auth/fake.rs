//! In-process fake identity provider
//!
//! [`FakeIdentityProvider`] keeps a table of accounts and a current user in
//! memory. Tests use it to drive login flows and to simulate the live
//! provider state changing underneath the application
//! ([`FakeIdentityProvider::set_current`]).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::auth::{AccessTokenSource, Identity, IdentityProvider};
use crate::error::{KampusError, Result};

/// Fake [`IdentityProvider`] for tests.
#[derive(Debug)]
pub struct FakeIdentityProvider {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    current: watch::Sender<Option<Identity>>,
    current_identity_calls: AtomicUsize,
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeIdentityProvider {
    /// Creates a provider with no accounts and nobody signed in.
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current,
            current_identity_calls: AtomicUsize::new(0),
        }
    }

    /// Registers an account that `sign_in` will accept.
    pub fn with_account(self, email: &str, password: &str, identity: Identity) -> Self {
        self.add_account(email, password, identity);
        self
    }

    /// Registers an account on an existing provider.
    pub fn add_account(&self, email: &str, password: &str, identity: Identity) {
        let mut accounts = self.accounts.lock().unwrap_or_else(|p| p.into_inner());
        accounts.insert(email.to_string(), (password.to_string(), identity));
    }

    /// Replaces the live current user, notifying subscribers.
    pub fn set_current(&self, identity: Option<Identity>) {
        self.current.send_replace(identity);
    }

    /// How many times `current_identity` has been queried.
    pub fn current_identity_calls(&self) -> usize {
        self.current_identity_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let found = {
            let accounts = self.accounts.lock().unwrap_or_else(|p| p.into_inner());
            accounts.get(email).cloned()
        };
        match found {
            Some((expected, identity)) if expected == password => {
                self.current.send_replace(Some(identity.clone()));
                Ok(identity)
            }
            _ => Err(KampusError::Authentication("Invalid email or password".to_string()).into()),
        }
    }

    async fn current_identity(&self) -> Option<Identity> {
        self.current_identity_calls.fetch_add(1, Ordering::SeqCst);
        self.current.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    async fn sign_out(&self) -> Result<()> {
        self.current.send_replace(None);
        Ok(())
    }
}

#[async_trait]
impl AccessTokenSource for FakeIdentityProvider {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self
            .current
            .borrow()
            .as_ref()
            .map(|identity| format!("fake-token-{}", identity.uid)))
    }
}
