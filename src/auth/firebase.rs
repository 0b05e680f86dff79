//! Firebase Authentication client
//!
//! Talks to the Identity Toolkit REST API for email/password sign-in and to
//! the Secure Token API to exchange the refresh token for fresh ID tokens.
//! The signed-in user is kept in memory and, unless disabled, mirrored into
//! the OS keyring through [`CredentialStore`] so that the provider still
//! knows its current user after a restart.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::{watch, Mutex};

use crate::auth::{AccessTokenSource, CredentialStore, Identity, IdentityProvider, StoredCredential};
use crate::config::FirebaseConfig;
use crate::error::{KampusError, Result};

/// ID tokens this close to expiry are refreshed before use.
const EXPIRY_BUFFER_SECONDS: i64 = 60;

/// Default ID token lifetime when the server omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
struct SignedInUser {
    identity: Identity,
    id_token: Option<String>,
    refresh_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl SignedInUser {
    fn has_fresh_token(&self) -> bool {
        match (&self.id_token, self.expires_at) {
            (Some(_), Some(expires_at)) => {
                Utc::now() < expires_at - chrono::Duration::seconds(EXPIRY_BUFFER_SECONDS)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct AuthState {
    restored: bool,
    user: Option<SignedInUser>,
}

/// [`IdentityProvider`] backed by Firebase Authentication.
///
/// # Examples
///
/// ```no_run
/// use kampus::auth::{FirebaseAuth, IdentityProvider};
/// use kampus::config::FirebaseConfig;
///
/// # #[tokio::main]
/// # async fn main() -> kampus::error::Result<()> {
/// let config = FirebaseConfig {
///     api_key: "AIza...".to_string(),
///     project_id: "my-project".to_string(),
///     ..Default::default()
/// };
/// let auth = FirebaseAuth::new(&config)?;
/// let identity = auth.sign_in("student@example.com", "password").await?;
/// println!("signed in as {}", identity.uid);
/// # Ok(())
/// # }
/// ```
pub struct FirebaseAuth {
    http: reqwest::Client,
    api_key: String,
    identity_toolkit_url: String,
    secure_token_url: String,
    credentials: Option<CredentialStore>,
    state: Mutex<AuthState>,
    changes: watch::Sender<Option<Identity>>,
}

impl FirebaseAuth {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `KampusError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &FirebaseConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(KampusError::Http)?;

        let credentials = config
            .persist_credentials
            .then(|| CredentialStore::new(&config.project_id));

        let (changes, _) = watch::channel(None);

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            identity_toolkit_url: config.identity_toolkit_url.trim_end_matches('/').to_string(),
            secure_token_url: config.secure_token_url.trim_end_matches('/').to_string(),
            credentials,
            state: Mutex::new(AuthState::default()),
            changes,
        })
    }

    /// Loads the persisted credential on first use.
    fn restore(&self, state: &mut AuthState) {
        if state.restored {
            return;
        }
        state.restored = true;

        let Some(store) = &self.credentials else {
            return;
        };
        match store.load() {
            Ok(Some(credential)) => {
                tracing::debug!(uid = %credential.identity.uid, "Restored provider credential");
                self.changes.send_replace(Some(credential.identity.clone()));
                state.user = Some(SignedInUser {
                    identity: credential.identity,
                    id_token: None,
                    refresh_token: credential.refresh_token,
                    expires_at: None,
                });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Could not read provider credential"),
        }
    }

    fn persist(&self, user: &SignedInUser) {
        let Some(store) = &self.credentials else {
            return;
        };
        let credential = StoredCredential {
            identity: user.identity.clone(),
            refresh_token: user.refresh_token.clone(),
            issued_at: Utc::now(),
        };
        if let Err(e) = store.save(&credential) {
            tracing::warn!(error = %e, "Could not persist provider credential");
        }
    }

    fn forget(&self, state: &mut AuthState) {
        state.user = None;
        if let Some(store) = &self.credentials {
            if let Err(e) = store.delete() {
                tracing::warn!(error = %e, "Could not delete provider credential");
            }
        }
        self.changes.send_replace(None);
    }

    async fn refresh(&self, user: &mut SignedInUser) -> Result<()> {
        let url = format!("{}/v1/token", self.secure_token_url);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", user.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let code = error_code(response).await;
            return Err(KampusError::Authentication(format!(
                "Session refresh rejected ({}): {}",
                status, code
            ))
            .into());
        }

        let body: RefreshResponse = response.json().await?;
        if body.user_id != user.identity.uid {
            return Err(KampusError::Authentication(
                "Refresh token belongs to a different user".to_string(),
            )
            .into());
        }

        user.id_token = Some(body.id_token);
        user.refresh_token = body.refresh_token;
        user.expires_at = Some(expiry_from(body.expires_in.as_deref()));
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let url = format!("{}/v1/accounts:signInWithPassword", self.identity_toolkit_url);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let code = error_code(response).await;
            tracing::debug!(code = %code, "Sign-in rejected");
            return Err(KampusError::Authentication(describe_auth_error(&code)).into());
        }

        let body: SignInResponse = response.json().await?;
        let identity = Identity {
            uid: body.local_id,
            email: non_empty(body.email),
            display_name: non_empty(body.display_name),
        };
        let user = SignedInUser {
            identity: identity.clone(),
            id_token: Some(body.id_token),
            refresh_token: body.refresh_token,
            expires_at: Some(expiry_from(body.expires_in.as_deref())),
        };

        let mut state = self.state.lock().await;
        state.restored = true;
        self.persist(&user);
        state.user = Some(user);
        self.changes.send_replace(Some(identity.clone()));

        tracing::info!(uid = %identity.uid, "Signed in with identity provider");
        Ok(identity)
    }

    async fn current_identity(&self) -> Option<Identity> {
        let mut state = self.state.lock().await;
        self.restore(&mut state);
        state.user.as_ref().map(|u| u.identity.clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.changes.subscribe()
    }

    async fn sign_out(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.restored = true;
        self.forget(&mut state);
        tracing::info!("Signed out of identity provider");
        Ok(())
    }
}

#[async_trait]
impl AccessTokenSource for FirebaseAuth {
    async fn access_token(&self) -> Result<Option<String>> {
        let mut state = self.state.lock().await;
        self.restore(&mut state);

        let Some(mut user) = state.user.clone() else {
            return Ok(None);
        };
        if !user.has_fresh_token() {
            if let Err(e) = self.refresh(&mut user).await {
                if matches!(
                    e.downcast_ref::<KampusError>(),
                    Some(KampusError::Authentication(_))
                ) {
                    tracing::warn!(error = %e, "Provider session is no longer valid");
                    self.forget(&mut state);
                }
                return Err(e);
            }
            self.persist(&user);
        }
        let token = user.id_token.clone();
        state.user = Some(user);
        Ok(token)
    }
}

/// Extracts Firebase's error code (e.g. `INVALID_PASSWORD`) from a failed
/// response. Some codes carry a trailing " : explanation".
async fn error_code(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => envelope
            .error
            .message
            .split(" : ")
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
        Err(_) => format!("HTTP {}", status.as_u16()),
    }
}

/// Maps a Firebase Authentication error code to a message fit for the user.
pub fn describe_auth_error(code: &str) -> String {
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password".to_string()
        }
        "USER_DISABLED" => "This account has been disabled".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many failed attempts, try again later".to_string(),
        "INVALID_EMAIL" => "The email address is badly formatted".to_string(),
        "MISSING_PASSWORD" => "Password is required".to_string(),
        other => format!("Sign-in failed: {}", other),
    }
}

fn expiry_from(expires_in: Option<&str>) -> DateTime<Utc> {
    let seconds = expires_in
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS);
    Utc::now() + chrono::Duration::seconds(seconds)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
