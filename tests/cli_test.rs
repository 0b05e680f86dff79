#![allow(deprecated)]
//! Command-line behavior of the `kampus` binary

mod common;

use std::path::Path;
use std::sync::Arc;

use assert_cmd::Command;
use common::temp_config_file;
use kampus::kv::SledStore;
use kampus::session::{SessionRecord, SessionStore};
use predicates::prelude::*;

const MEMORY_CONFIG: &str = r#"
firebase:
  api_key: test-key
  project_id: demo
  persist_credentials: false
storage:
  backend: memory
"#;

fn kampus(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kampus").unwrap();
    cmd.arg("--config")
        .arg(config)
        .env("NO_COLOR", "1")
        .env_remove("KAMPUS_API_KEY")
        .env_remove("KAMPUS_PROJECT_ID")
        .env_remove("KAMPUS_STORAGE_PATH")
        .env_remove("KAMPUS_STORAGE_BACKEND")
        .env_remove("KAMPUS_FETCH_TIMEOUT_SECONDS")
        .env_remove("KAMPUS_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn sled_config(storage: &Path) -> String {
    format!(
        r#"
firebase:
  api_key: test-key
  project_id: demo
  persist_credentials: false
storage:
  backend: sled
  path: {}
"#,
        storage.display()
    )
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("kampus").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("whoami"))
        .stdout(predicate::str::contains("profile"));
}

#[test]
fn test_whoami_when_logged_out() {
    let (_dir, config) = temp_config_file(MEMORY_CONFIG);
    kampus(&config)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[test]
fn test_profile_when_logged_out_asks_for_login() {
    let (_dir, config) = temp_config_file(MEMORY_CONFIG);
    kampus(&config)
        .arg("profile")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Please log in to view your student record.",
        ));
}

#[test]
fn test_profile_json_reports_state() {
    let (_dir, config) = temp_config_file(MEMORY_CONFIG);
    kampus(&config)
        .args(["profile", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"unauthenticated\""));
}

#[test]
fn test_missing_api_key_fails() {
    let (_dir, config) = temp_config_file("storage:\n  backend: memory\n");
    kampus(&config)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("api_key"));
}

#[test]
fn test_missing_config_file_is_logged_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");
    kampus(&missing)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"))
        .stdout(predicate::str::contains("Config file not found").not());
}

#[test]
fn test_invalid_config_fails_validation() {
    let (_dir, config) = temp_config_file(
        r#"
firebase:
  api_key: test-key
  project_id: demo
resolver:
  fetch_timeout_seconds: 0
"#,
    );
    kampus(&config)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("fetch_timeout_seconds"));
}

#[test]
fn test_cached_session_is_seen_by_later_process_and_cleared_by_logout() {
    let storage_dir = tempfile::tempdir().unwrap();
    let storage = storage_dir.path().join("session.sled");
    {
        let sessions = SessionStore::new(Arc::new(SledStore::open(&storage).unwrap()));
        let record = SessionRecord::new("u1", Some("budi@x.com".to_string()), None).unwrap();
        assert!(sessions.save(&record));
    }

    let (_dir, config) = temp_config_file(&sled_config(&storage));

    kampus(&config)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("u1 (budi@x.com) via cache"));

    kampus(&config)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out."));

    kampus(&config)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}
