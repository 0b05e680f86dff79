//! Error types for Kampus
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Kampus operations
///
/// Covers configuration loading, identity provider calls, document store
/// reads, local persistence, and the serialization layers in between.
#[derive(Error, Debug)]
pub enum KampusError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sign-in rejected by the identity provider (bad credentials, disabled
    /// account, provider-side failure)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Local key-value persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document store read errors (network, permission, malformed response)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// An external call did not complete within its deadline
    #[error("Operation timed out after {seconds}s: {operation}")]
    Timeout {
        /// What was being waited on
        operation: String,
        /// The configured deadline
        seconds: u64,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Kampus operations
///
/// Uses `anyhow::Error` so call sites can attach context while still
/// downcasting to [`KampusError`] where the variant matters.
pub type Result<T> = anyhow::Result<T>;
