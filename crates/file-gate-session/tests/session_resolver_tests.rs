//! Integration tests for startup scene resolution.

use std::sync::Arc;

use file_gate_core::{GateConfig, LockRecord, LockStatus, Scene};
use file_gate_session::{KeyValueStore, LockStore, MemoryStore, ResumeReason, resolve_session};

const NOW: u64 = 50_000_000;

fn seeded(raw: Option<String>) -> (Arc<MemoryStore>, LockStore) {
    let backend = Arc::new(MemoryStore::new());
    if let Some(raw) = raw {
        backend.set("lock", &raw).expect("seed write should succeed");
    }
    let locks = LockStore::new(backend.clone(), "lock");
    (backend, locks)
}

fn record(status: LockStatus, timestamp: u64) -> Option<String> {
    Some(
        LockRecord::new(status, timestamp)
            .to_json()
            .expect("record should encode"),
    )
}

#[test]
fn session_resolver_tests_no_lock_resolves_to_login() {
    let (_, mut locks) = seeded(None);
    let resolution = resolve_session(&mut locks, NOW, GateConfig::default().stale_threshold_ms());
    assert_eq!(resolution.scene, Scene::Login);
    assert_eq!(resolution.reason, ResumeReason::NoLock);
}

#[test]
fn session_resolver_tests_waiting_lock_resolves_to_busy_and_is_kept() {
    let (backend, mut locks) = seeded(record(LockStatus::Waiting, NOW));
    let resolution = resolve_session(&mut locks, NOW, GateConfig::default().stale_threshold_ms());

    assert_eq!(resolution.scene, Scene::Busy);
    assert_eq!(resolution.reason, ResumeReason::ActiveElsewhere);
    assert!(backend.get("lock").expect("read should succeed").is_some());
}

#[test]
fn session_resolver_tests_ready_lock_is_cleared_and_resolves_to_login() {
    let (backend, mut locks) = seeded(record(LockStatus::Ready, NOW));
    let resolution = resolve_session(&mut locks, NOW, GateConfig::default().stale_threshold_ms());

    assert_eq!(resolution.scene, Scene::Login);
    assert_eq!(resolution.reason, ResumeReason::FinishedSession);
    assert_eq!(backend.get("lock").expect("read should succeed"), None);
}

#[test]
fn session_resolver_tests_stale_waiting_lock_is_cleared() {
    let threshold = GateConfig::default().stale_threshold_ms();
    let (backend, mut locks) = seeded(record(LockStatus::Waiting, NOW - threshold - 1));
    let resolution = resolve_session(&mut locks, NOW, threshold);

    assert_eq!(resolution.scene, Scene::Login);
    assert_eq!(resolution.reason, ResumeReason::StaleLock);
    assert_eq!(backend.get("lock").expect("read should succeed"), None);
}

#[test]
fn session_resolver_tests_lock_just_inside_threshold_is_still_busy() {
    let threshold = GateConfig::default().stale_threshold_ms();
    let (_, mut locks) = seeded(record(LockStatus::Waiting, NOW - threshold + 1));
    let resolution = resolve_session(&mut locks, NOW, threshold);
    assert_eq!(resolution.scene, Scene::Busy);
}

#[test]
fn session_resolver_tests_corrupt_lock_resolves_like_no_lock() {
    let (_, mut locks) = seeded(Some("{broken".to_string()));
    let resolution = resolve_session(&mut locks, NOW, GateConfig::default().stale_threshold_ms());
    assert_eq!(resolution.scene, Scene::Login);
    assert_eq!(resolution.reason, ResumeReason::NoLock);
    assert_eq!(resolution.observed, None);
}
