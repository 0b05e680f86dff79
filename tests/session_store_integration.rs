//! Session cache behavior over the durable sled engine

mod common;

use std::sync::Arc;

use common::{create_temp_sled, session_store_over};
use kampus::kv::{open_with_fallback, KeyValueStore, SledStore};
use kampus::session::{SessionRecord, SessionStore, SESSION_KEY};

fn record(uid: &str, email: &str) -> SessionRecord {
    SessionRecord::new(uid, Some(email.to_string()), None).expect("valid record")
}

#[test]
fn test_save_wipes_every_other_key() {
    let (kv, _tmp) = create_temp_sled();
    kv.set("draft", "something").unwrap();
    kv.set("prefs", "{\"theme\":\"dark\"}").unwrap();

    let sessions = session_store_over(kv.clone());
    assert!(sessions.save(&record("u1", "a@x.com")));

    assert_eq!(kv.keys().unwrap(), vec![SESSION_KEY.to_string()]);
    assert_eq!(sessions.load(), Some(record("u1", "a@x.com")));
}

#[test]
fn test_second_login_replaces_first() {
    let (kv, _tmp) = create_temp_sled();
    let sessions = session_store_over(kv);

    sessions.save(&record("A", "a@x.com"));
    sessions.save(&record("B", "b@x.com"));

    let loaded = sessions.load().unwrap();
    assert_eq!(loaded.uid, "B");
    assert_eq!(loaded.email.as_deref(), Some("b@x.com"));
}

#[test]
fn test_session_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("session.sled");

    {
        let sessions = SessionStore::new(Arc::new(SledStore::open(&path).unwrap()));
        assert!(sessions.save(&record("u1", "a@x.com")));
    }

    let sessions = SessionStore::new(Arc::new(SledStore::open(&path).unwrap()));
    assert_eq!(sessions.load().map(|r| r.uid), Some("u1".to_string()));
}

#[test]
fn test_clear_is_idempotent_and_persists() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("session.sled");

    {
        let sessions = SessionStore::new(Arc::new(SledStore::open(&path).unwrap()));
        sessions.save(&record("u1", "a@x.com"));
        sessions.clear();
        sessions.clear();
        assert_eq!(sessions.load(), None);
    }

    let sessions = SessionStore::new(Arc::new(SledStore::open(&path).unwrap()));
    assert_eq!(sessions.load(), None);
}

#[test]
fn test_corrupt_session_reads_as_absent() {
    let (kv, _tmp) = create_temp_sled();
    kv.set(SESSION_KEY, "{not json").unwrap();

    let sessions = session_store_over(kv);
    assert_eq!(sessions.load(), None);
}

#[test]
fn test_session_written_by_other_client_is_read() {
    let (kv, _tmp) = create_temp_sled();
    kv.set(SESSION_KEY, r#"{"uid":"u9","email":null,"displayName":"Sari"}"#)
        .unwrap();

    let loaded = session_store_over(kv).load().unwrap();
    assert_eq!(loaded.uid, "u9");
    assert_eq!(loaded.display_name.as_deref(), Some("Sari"));
}

#[test]
fn test_fallback_store_still_holds_a_session() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("not-a-directory");
    std::fs::write(&blocker, b"file").unwrap();

    let kv = open_with_fallback(blocker.join("session.sled"));
    assert!(!kv.is_durable());

    let sessions = SessionStore::new(kv);
    assert!(sessions.save(&record("u1", "a@x.com")));
    assert_eq!(sessions.load().map(|r| r.uid), Some("u1".to_string()));
    assert!(!sessions.is_durable());
}
