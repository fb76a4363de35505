//! Integration tests for the directory-backed durable store.

use std::sync::Arc;

use file_gate_core::{LockRecord, LockStatus};
use file_gate_session::{FileStore, KeyValueStore, LockStore};
use tempfile::tempdir;

#[test]
fn file_store_tests_lock_survives_reopening_the_store() {
    let dir = tempdir().expect("tempdir");

    let first = FileStore::open(dir.path()).expect("store should open");
    let mut locks = LockStore::new(Arc::new(first), "fileDownloaderSession");
    locks
        .set_lock(LockStatus::Waiting, 77)
        .expect("durable write should succeed");

    let reopened = FileStore::open(dir.path()).expect("store should reopen");
    let mut locks = LockStore::new(Arc::new(reopened), "fileDownloaderSession");
    assert_eq!(
        locks.read_lock(),
        Some(LockRecord::new(LockStatus::Waiting, 77))
    );
}

#[test]
fn file_store_tests_removing_missing_key_is_not_an_error() {
    let dir = tempdir().expect("tempdir");
    let store = FileStore::open(dir.path()).expect("store should open");

    store.remove("absent").expect("removing a missing key should succeed");
    assert_eq!(store.get("absent").expect("read should succeed"), None);
}

#[test]
fn file_store_tests_keys_are_sanitized_into_the_store_directory() {
    let dir = tempdir().expect("tempdir");
    let store = FileStore::open(dir.path()).expect("store should open");

    store.set("../escape/key", "value").expect("write should succeed");
    assert_eq!(
        store.get("../escape/key").expect("read should succeed"),
        Some("value".to_string())
    );
    assert!(store.dir().join("___escape_key.json").exists());
    assert!(!store.dir().join("..").join("escape").exists());
}
