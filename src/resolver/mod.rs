//! Session resolution protocol
//!
//! Each time the student record screen is shown, [`SessionResolver::resolve`]
//! works out who the current user is and fetches that user's record:
//!
//! 1. Session cache first. A cached record wins even if the live provider
//!    reports someone else.
//! 2. Otherwise the identity provider's live current user.
//! 3. Otherwise [`Resolution::Unauthenticated`]; no document is requested.
//!    A provider that does not answer in time ends in
//!    [`Resolution::FetchError`] instead, without an identity.
//! 4. With a uid in hand, one point read of `collection/uid`, ending in
//!    [`Resolution::Ready`], [`Resolution::NotFound`] or
//!    [`Resolution::FetchError`].
//!
//! Nothing is carried over between calls. [`StudentView`] wraps the resolver
//! with the presentation state and the activation sequencing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;

use crate::auth::IdentityProvider;
use crate::config::ResolverConfig;
use crate::documents::DocumentStore;
use crate::error::{KampusError, Result};
use crate::session::SessionStore;
use crate::student::StudentRecord;

pub mod view;

pub use view::{Activation, StudentView, ViewState};

/// Where a resolved uid came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentitySource {
    /// The local session cache
    Cache,
    /// The identity provider's live current user
    LiveProvider,
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentitySource::Cache => write!(f, "cache"),
            IdentitySource::LiveProvider => write!(f, "live-provider"),
        }
    }
}

/// The uid one activation settled on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    /// Lookup key for the student record
    pub uid: String,
    /// Which source supplied it
    pub source: IdentitySource,
}

/// Terminal state of one activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resolution {
    /// Neither the cache nor the live provider knows a user
    Unauthenticated,
    /// A user was resolved but has no record
    NotFound {
        /// The resolved user
        identity: ResolvedIdentity,
    },
    /// The record could not be read
    FetchError {
        /// The resolved user; `None` when the identity query itself failed
        identity: Option<ResolvedIdentity>,
        /// Last error seen
        reason: String,
    },
    /// The record was read and normalized
    Ready {
        /// The resolved user
        identity: ResolvedIdentity,
        /// The student's record
        record: StudentRecord,
    },
}

impl Resolution {
    /// Machine-readable name of the state.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Resolution::Unauthenticated => "unauthenticated",
            Resolution::NotFound { .. } => "not_found",
            Resolution::FetchError { .. } => "fetch_error",
            Resolution::Ready { .. } => "ready",
        }
    }

    /// Message to show the user, `None` when there is a record to show.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Resolution::Unauthenticated => Some("Please log in to view your student record."),
            Resolution::NotFound { .. } => {
                Some("Student record not found, please contact the administrator.")
            }
            Resolution::FetchError { .. } => Some("Failed to load student record."),
            Resolution::Ready { .. } => None,
        }
    }

    /// The record, when ready.
    pub fn record(&self) -> Option<&StudentRecord> {
        match self {
            Resolution::Ready { record, .. } => Some(record),
            _ => None,
        }
    }

    /// The resolved identity, unless unauthenticated.
    pub fn identity(&self) -> Option<&ResolvedIdentity> {
        match self {
            Resolution::Unauthenticated => None,
            Resolution::FetchError { identity, .. } => identity.as_ref(),
            Resolution::NotFound { identity } | Resolution::Ready { identity, .. } => Some(identity),
        }
    }
}

/// Runs the resolution protocol against injected collaborators.
pub struct SessionResolver {
    sessions: Arc<SessionStore>,
    provider: Arc<dyn IdentityProvider>,
    documents: Arc<dyn DocumentStore>,
    settings: ResolverConfig,
}

impl SessionResolver {
    /// Creates a resolver.
    pub fn new(
        sessions: Arc<SessionStore>,
        provider: Arc<dyn IdentityProvider>,
        documents: Arc<dyn DocumentStore>,
        settings: ResolverConfig,
    ) -> Self {
        Self {
            sessions,
            provider,
            documents,
            settings,
        }
    }

    /// Decides who the current user is.
    ///
    /// `Ok(None)` means nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns [`KampusError::Timeout`] when the provider query exceeds
    /// `identity_timeout_seconds`.
    pub async fn resolve_identity(&self) -> Result<Option<ResolvedIdentity>> {
        if let Some(record) = self.sessions.load() {
            tracing::debug!(uid = %record.uid, "Identity resolved from session cache");
            return Ok(Some(ResolvedIdentity {
                uid: record.uid,
                source: IdentitySource::Cache,
            }));
        }

        let deadline = Duration::from_secs(self.settings.identity_timeout_seconds);
        match tokio::time::timeout(deadline, self.provider.current_identity()).await {
            Ok(Some(identity)) => {
                tracing::debug!(uid = %identity.uid, "Identity resolved from live provider");
                Ok(Some(ResolvedIdentity {
                    uid: identity.uid,
                    source: IdentitySource::LiveProvider,
                }))
            }
            Ok(None) => Ok(None),
            Err(_) => {
                tracing::warn!(
                    seconds = self.settings.identity_timeout_seconds,
                    "Identity provider did not answer in time"
                );
                Err(KampusError::Timeout {
                    operation: "query current user".to_string(),
                    seconds: self.settings.identity_timeout_seconds,
                }
                .into())
            }
        }
    }

    /// Point-reads the record for `identity`, retrying failed reads.
    pub async fn fetch_record(&self, identity: ResolvedIdentity) -> Resolution {
        let collection = self.settings.collection.as_str();
        let deadline = Duration::from_secs(self.settings.fetch_timeout_seconds);
        let attempts = self.settings.fetch_retries + 1;
        let mut backoff_ms = self.settings.retry_backoff_ms;
        let mut reason = String::new();

        for attempt in 1..=attempts {
            let outcome =
                tokio::time::timeout(deadline, self.documents.get_by_key(collection, &identity.uid))
                    .await;

            match outcome {
                Ok(Ok(Some(document))) => {
                    let record = StudentRecord::from_document(&document);
                    return Resolution::Ready { identity, record };
                }
                Ok(Ok(None)) => {
                    tracing::warn!(uid = %identity.uid, "No student document for uid");
                    return Resolution::NotFound { identity };
                }
                Ok(Err(e)) => reason = e.to_string(),
                Err(_) => {
                    reason = KampusError::Timeout {
                        operation: format!("fetch {}/{}", collection, identity.uid),
                        seconds: self.settings.fetch_timeout_seconds,
                    }
                    .to_string()
                }
            }

            if attempt < attempts {
                tracing::warn!(
                    attempt,
                    attempts,
                    error = %reason,
                    "Student record fetch failed, retrying"
                );
                tokio::time::sleep(retry_delay(backoff_ms)).await;
                backoff_ms = backoff_ms.saturating_mul(2);
            }
        }

        tracing::error!(uid = %identity.uid, error = %reason, "Student record fetch failed");
        Resolution::FetchError {
            identity: Some(identity),
            reason,
        }
    }

    /// One full activation: resolve the identity, then fetch its record.
    pub async fn resolve(&self) -> Resolution {
        match self.resolve_identity().await {
            Ok(Some(identity)) => self.fetch_record(identity).await,
            Ok(None) => Resolution::Unauthenticated,
            Err(e) => Resolution::FetchError {
                identity: None,
                reason: e.to_string(),
            },
        }
    }
}

/// Backoff plus up to 25% jitter.
fn retry_delay(backoff_ms: u64) -> Duration {
    let jitter = rand::rng().random_range(0..=backoff_ms / 4);
    Duration::from_millis(backoff_ms.saturating_add(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Identity, MockIdentityProvider};
    use crate::documents::MockDocumentStore;
    use crate::kv::MemoryStore;
    use crate::session::SessionRecord;
    use mockall::predicate::eq;
    use serde_json::json;

    fn settings() -> ResolverConfig {
        ResolverConfig {
            fetch_retries: 0,
            retry_backoff_ms: 1,
            ..Default::default()
        }
    }

    fn sessions_with(uid: Option<&str>) -> Arc<SessionStore> {
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStore::new())));
        if let Some(uid) = uid {
            store.save(&SessionRecord::new(uid, None, None).unwrap());
        }
        store
    }

    #[tokio::test]
    async fn test_cache_hit_never_asks_live_provider() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_current_identity().never();

        let mut documents = MockDocumentStore::new();
        documents
            .expect_get_by_key()
            .with(eq("mahasiswa"), eq("R"))
            .times(1)
            .returning(|_, _| Ok(Some(json!({"nama": "Rina"}))));

        let resolver = SessionResolver::new(
            sessions_with(Some("R")),
            Arc::new(provider),
            Arc::new(documents),
            settings(),
        );
        let resolution = resolver.resolve().await;
        assert_eq!(resolution.reason_code(), "ready");
        assert_eq!(
            resolution.identity().map(|i| i.source),
            Some(IdentitySource::Cache)
        );
    }

    #[tokio::test]
    async fn test_unauthenticated_never_fetches() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_current_identity().times(1).returning(|| None);

        let mut documents = MockDocumentStore::new();
        documents.expect_get_by_key().never();

        let resolver = SessionResolver::new(
            sessions_with(None),
            Arc::new(provider),
            Arc::new(documents),
            settings(),
        );
        assert_eq!(resolver.resolve().await, Resolution::Unauthenticated);
    }

    #[tokio::test]
    async fn test_live_provider_fallback() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_current_identity()
            .returning(|| Some(Identity::new("U")));

        let mut documents = MockDocumentStore::new();
        documents
            .expect_get_by_key()
            .with(eq("mahasiswa"), eq("U"))
            .returning(|_, _| Ok(None));

        let resolver = SessionResolver::new(
            sessions_with(None),
            Arc::new(provider),
            Arc::new(documents),
            settings(),
        );
        let resolution = resolver.resolve().await;
        assert_eq!(
            resolution,
            Resolution::NotFound {
                identity: ResolvedIdentity {
                    uid: "U".to_string(),
                    source: IdentitySource::LiveProvider,
                }
            }
        );
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_current_identity().never();
        let mut documents = MockDocumentStore::new();
        documents.expect_get_by_key().times(1).returning(|_, _| Ok(None));

        let resolver = SessionResolver::new(
            sessions_with(Some("u1")),
            Arc::new(provider),
            Arc::new(documents),
            ResolverConfig {
                fetch_retries: 3,
                retry_backoff_ms: 1,
                ..Default::default()
            },
        );
        assert_eq!(resolver.resolve().await.reason_code(), "not_found");
    }

    #[tokio::test]
    async fn test_fetch_errors_are_retried_then_reported() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_current_identity().never();
        let mut documents = MockDocumentStore::new();
        documents
            .expect_get_by_key()
            .times(3)
            .returning(|_, _| Err(KampusError::Fetch("unavailable".to_string()).into()));

        let resolver = SessionResolver::new(
            sessions_with(Some("u1")),
            Arc::new(provider),
            Arc::new(documents),
            ResolverConfig {
                fetch_retries: 2,
                retry_backoff_ms: 1,
                ..Default::default()
            },
        );
        match resolver.resolve().await {
            Resolution::FetchError { identity, reason } => {
                assert_eq!(identity.map(|i| i.uid), Some("u1".to_string()));
                assert!(reason.contains("unavailable"));
            }
            other => panic!("expected FetchError, got {:?}", other),
        }
    }

    #[test]
    fn test_messages_distinguish_terminal_states() {
        let identity = ResolvedIdentity {
            uid: "u".to_string(),
            source: IdentitySource::Cache,
        };
        let unauth = Resolution::Unauthenticated.message().unwrap();
        let missing = Resolution::NotFound {
            identity: identity.clone(),
        }
        .message()
        .unwrap();
        let failed = Resolution::FetchError {
            identity: Some(identity),
            reason: "x".to_string(),
        }
        .message()
        .unwrap();

        assert!(unauth.contains("log in"));
        assert!(missing.contains("administrator"));
        assert_ne!(unauth, missing);
        assert_ne!(missing, failed);
    }

    #[test]
    fn test_retry_delay_stays_within_jitter_bounds() {
        for _ in 0..50 {
            let delay = retry_delay(400);
            assert!(delay >= Duration::from_millis(400));
            assert!(delay <= Duration::from_millis(500));
        }
    }

    #[test]
    fn test_retry_delay_saturates_on_huge_backoff() {
        assert_eq!(retry_delay(u64::MAX), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_identity_timeout_fetch_error_has_no_identity() {
        let resolution = Resolution::FetchError {
            identity: None,
            reason: "timed out".to_string(),
        };
        assert_eq!(resolution.identity(), None);
        assert_eq!(resolution.message(), Some("Failed to load student record."));
    }

    #[test]
    fn test_resolution_serializes_with_state_tag() {
        let json = serde_json::to_value(Resolution::Unauthenticated).unwrap();
        assert_eq!(json, json!({"state": "unauthenticated"}));
    }

    #[test]
    fn test_identity_source_display() {
        assert_eq!(IdentitySource::Cache.to_string(), "cache");
        assert_eq!(IdentitySource::LiveProvider.to_string(), "live-provider");
    }
}
