//! Configuration management for Kampus
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{KampusError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Kampus
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Firebase project and endpoint settings
    #[serde(default)]
    pub firebase: FirebaseConfig,
    /// Local session storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Session resolution and record fetch settings
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Firebase project configuration
///
/// Endpoint URLs default to Google's production hosts and are overridable so
/// tests and emulators can point the clients elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// Web API key of the Firebase project
    #[serde(default)]
    pub api_key: String,

    /// Firebase / Google Cloud project id
    #[serde(default)]
    pub project_id: String,

    /// Base URL of the Identity Toolkit API
    #[serde(default = "default_identity_toolkit_url")]
    pub identity_toolkit_url: String,

    /// Base URL of the Secure Token API
    #[serde(default = "default_secure_token_url")]
    pub secure_token_url: String,

    /// Base URL of the Firestore REST API
    #[serde(default = "default_firestore_url")]
    pub firestore_url: String,

    /// Keep the provider's signed-in credential in the OS keyring
    #[serde(default = "default_persist_credentials")]
    pub persist_credentials: bool,

    /// Per-request HTTP timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_identity_toolkit_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_secure_token_url() -> String {
    "https://securetoken.googleapis.com".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_persist_credentials() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            identity_toolkit_url: default_identity_toolkit_url(),
            secure_token_url: default_secure_token_url(),
            firestore_url: default_firestore_url(),
            persist_credentials: default_persist_credentials(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Which key-value engine backs the session store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Durable on-disk engine, falling back to memory if it cannot open
    #[default]
    Sled,
    /// Memory only; the session is forgotten when the process exits
    Memory,
}

/// Local session storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage engine
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database directory; defaults to the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolves the on-disk location of the session database.
    ///
    /// # Errors
    ///
    /// Returns `KampusError::Config` when no path is configured and the
    /// platform data directory cannot be determined.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let dirs = ProjectDirs::from("id", "kampus", "kampus").ok_or_else(|| {
            KampusError::Config("Could not determine data directory".to_string())
        })?;
        Ok(dirs.data_dir().join("session.sled"))
    }
}

/// Session resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Collection holding one document per student uid
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Deadline for one document fetch (seconds)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,

    /// Deadline for asking the identity provider for its current user (seconds)
    #[serde(default = "default_identity_timeout")]
    pub identity_timeout_seconds: u64,

    /// Extra attempts after a failed fetch
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,

    /// Delay before the first retry; doubles on each further retry (ms)
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_collection() -> String {
    "mahasiswa".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_identity_timeout() -> u64 {
    5
}

fn default_fetch_retries() -> u32 {
    2
}

fn default_retry_backoff() -> u64 {
    250
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            fetch_timeout_seconds: default_fetch_timeout(),
            identity_timeout_seconds: default_identity_timeout(),
            fetch_retries: default_fetch_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Upper bound on `resolver.fetch_retries`
const MAX_FETCH_RETRIES: u32 = 10;

/// Upper bound on `resolver.retry_backoff_ms`
const MAX_RETRY_BACKOFF_MS: u64 = 60_000;

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| KampusError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| KampusError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_key) = std::env::var("KAMPUS_API_KEY") {
            self.firebase.api_key = api_key;
        }

        if let Ok(project_id) = std::env::var("KAMPUS_PROJECT_ID") {
            tracing::debug!(project_id = %project_id, "Env override: KAMPUS_PROJECT_ID");
            self.firebase.project_id = project_id;
        }

        if let Ok(persist) = std::env::var("KAMPUS_PERSIST_CREDENTIALS") {
            match persist.parse::<bool>() {
                Ok(v) => {
                    self.firebase.persist_credentials = v;
                    tracing::debug!(persist = v, "Env override: KAMPUS_PERSIST_CREDENTIALS");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for KAMPUS_PERSIST_CREDENTIALS: {}", persist)
                }
            }
        }

        if let Ok(path) = std::env::var("KAMPUS_STORAGE_PATH") {
            tracing::debug!(path = %path, "Env override: KAMPUS_STORAGE_PATH");
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Ok(backend) = std::env::var("KAMPUS_STORAGE_BACKEND") {
            match backend.to_lowercase().as_str() {
                "sled" => self.storage.backend = StorageBackend::Sled,
                "memory" => self.storage.backend = StorageBackend::Memory,
                _ => tracing::warn!("Invalid KAMPUS_STORAGE_BACKEND: {}", backend),
            }
        }

        if let Ok(collection) = std::env::var("KAMPUS_COLLECTION") {
            tracing::debug!(collection = %collection, "Env override: KAMPUS_COLLECTION");
            self.resolver.collection = collection;
        }

        if let Ok(timeout) = std::env::var("KAMPUS_FETCH_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.resolver.fetch_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid KAMPUS_FETCH_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(retries) = std::env::var("KAMPUS_FETCH_RETRIES") {
            if let Ok(value) = retries.parse() {
                self.resolver.fetch_retries = value;
            } else {
                tracing::warn!("Invalid KAMPUS_FETCH_RETRIES: {}", retries);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(path) = &cli.storage_path {
            self.storage.path = Some(PathBuf::from(path));
        }
        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
    }

    /// Validate the configuration
    ///
    /// Checks everything that must hold regardless of which command runs.
    /// Commands that contact Firebase additionally call
    /// [`validate_remote`](Self::validate_remote).
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.resolver.collection.trim().is_empty() {
            return Err(
                KampusError::Config("resolver.collection cannot be empty".to_string()).into(),
            );
        }

        if self.resolver.fetch_timeout_seconds == 0 {
            return Err(KampusError::Config(
                "resolver.fetch_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.resolver.identity_timeout_seconds == 0 {
            return Err(KampusError::Config(
                "resolver.identity_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.resolver.fetch_retries > MAX_FETCH_RETRIES {
            return Err(KampusError::Config(format!(
                "resolver.fetch_retries must be less than or equal to {}",
                MAX_FETCH_RETRIES
            ))
            .into());
        }

        if self.resolver.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
            return Err(KampusError::Config(format!(
                "resolver.retry_backoff_ms must be less than or equal to {}",
                MAX_RETRY_BACKOFF_MS
            ))
            .into());
        }

        if self.firebase.request_timeout_seconds == 0 {
            return Err(KampusError::Config(
                "firebase.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        for (name, value) in [
            ("identity_toolkit_url", &self.firebase.identity_toolkit_url),
            ("secure_token_url", &self.firebase.secure_token_url),
            ("firestore_url", &self.firebase.firestore_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(KampusError::Config(format!(
                    "firebase.{} is not a valid URL: {}",
                    name, value
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate the settings needed to talk to Firebase
    ///
    /// # Errors
    ///
    /// Returns error if the API key or project id is missing
    pub fn validate_remote(&self) -> Result<()> {
        if self.firebase.api_key.trim().is_empty() {
            return Err(KampusError::Config(
                "firebase.api_key is required (or set KAMPUS_API_KEY)".to_string(),
            )
            .into());
        }
        if self.firebase.project_id.trim().is_empty() {
            return Err(KampusError::Config(
                "firebase.project_id is required (or set KAMPUS_PROJECT_ID)".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
