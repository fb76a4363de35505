//! Integration tests for the download click and teardown behavior.

mod common;

use file_gate_app::{DownloadTarget, PortalEvent};
use file_gate_core::LockStatus;

use common::{FILE_URL, loaded_harness, stored_lock};

const WAIT_MS: u64 = 5 * 60 * 1000;

#[test]
fn download_click_tests_control_is_disabled_until_prepared() {
    let (mut harness, _store) = loaded_harness();
    assert_eq!(harness.portal.click_download(), None);

    harness.login();
    harness.advance_in_steps(10_000, 1_000);
    assert_eq!(harness.portal.click_download(), None);
}

#[test]
fn download_click_tests_click_clears_lock_after_delay() {
    let (mut harness, store) = loaded_harness();
    harness.login();
    harness.advance_in_steps(WAIT_MS + 300, 1_000);

    let target = harness.portal.click_download().expect("control should be enabled");
    assert_eq!(
        target,
        DownloadTarget {
            href: FILE_URL.to_string(),
            filename: "generated_file.ext".to_string(),
        }
    );

    assert!(harness.advance(999).is_empty());
    assert_eq!(
        stored_lock(&*store).map(|record| record.status),
        Some(LockStatus::Ready)
    );

    assert_eq!(harness.advance(1), vec![PortalEvent::LockCleared]);
    assert_eq!(stored_lock(&*store), None);
}

#[test]
fn download_click_tests_repeated_clicks_schedule_one_clear() {
    let (mut harness, store) = loaded_harness();
    harness.login();
    harness.advance_in_steps(WAIT_MS + 300, 1_000);

    harness.portal.click_download();
    harness.advance(600);
    harness.portal.click_download();

    assert_eq!(harness.advance(400), vec![PortalEvent::LockCleared]);
    assert!(harness.advance(5_000).is_empty());
    assert_eq!(stored_lock(&*store), None);
}

#[test]
fn download_click_tests_unload_after_download_clears_own_lock() {
    let (mut harness, store) = loaded_harness();
    harness.login();
    harness.advance_in_steps(WAIT_MS + 300, 1_000);
    assert!(stored_lock(&*store).is_some());

    harness.portal.unload();
    assert_eq!(stored_lock(&*store), None);
}

#[test]
fn download_click_tests_unload_mid_wait_keeps_lock() {
    let (mut harness, store) = loaded_harness();
    harness.login();
    harness.advance_in_steps(30_000, 1_000);

    harness.portal.unload();
    assert_eq!(
        stored_lock(&*store).map(|record| record.status),
        Some(LockStatus::Waiting)
    );
}
