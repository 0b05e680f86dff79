use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use kampus::auth::{FakeIdentityProvider, Identity};
use kampus::config::{FirebaseConfig, ResolverConfig};
use kampus::documents::InMemoryDocumentStore;
use kampus::kv::{KeyValueStore, SledStore};
use kampus::session::SessionStore;
use serde_json::{json, Value};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_sled() -> (Arc<SledStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = SledStore::open(tmp.path().join("session.sled")).expect("failed to open sled");
    (Arc::new(store), tmp)
}

#[allow(dead_code)]
pub fn session_store_over(kv: Arc<dyn KeyValueStore>) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(kv))
}

#[allow(dead_code)]
pub fn budi_document() -> Value {
    json!({"nama": "Budi", "nim": "123", "jurusan": "TI", "angkatan": "2023"})
}

/// Provider that accepts `budi@x.com` / `secret` as uid `u1`.
#[allow(dead_code)]
pub fn budi_provider() -> Arc<FakeIdentityProvider> {
    Arc::new(FakeIdentityProvider::new().with_account(
        "budi@x.com",
        "secret",
        Identity::new("u1").with_email("budi@x.com"),
    ))
}

#[allow(dead_code)]
pub fn student_documents() -> Arc<InMemoryDocumentStore> {
    Arc::new(InMemoryDocumentStore::new().with_document("mahasiswa", "u1", budi_document()))
}

/// Resolver settings with short timeouts and fast retries.
#[allow(dead_code)]
pub fn quick_resolver_config() -> ResolverConfig {
    ResolverConfig {
        fetch_timeout_seconds: 1,
        identity_timeout_seconds: 1,
        fetch_retries: 2,
        retry_backoff_ms: 10,
        ..Default::default()
    }
}

/// Firebase settings pointing every endpoint at a mock server.
#[allow(dead_code)]
pub fn firebase_config_for(base_url: &str) -> FirebaseConfig {
    FirebaseConfig {
        api_key: "test-key".to_string(),
        project_id: "demo".to_string(),
        identity_toolkit_url: base_url.to_string(),
        secure_token_url: base_url.to_string(),
        firestore_url: base_url.to_string(),
        persist_credentials: false,
        request_timeout_seconds: 5,
    }
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
