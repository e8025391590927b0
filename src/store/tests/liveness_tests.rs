//! Tests for session lock files.

use super::*;
use fs2::FileExt;
use std::fs::OpenOptions;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn sid() -> SessionId {
    SessionId::parse("20251224_143022_abc1").unwrap()
}

#[test]
fn test_probe_missing_file_is_not_live() {
    let dir = tempdir().unwrap();
    let path = paths::session_lock_path(dir.path(), "nope");
    assert!(!probe(&path).unwrap());
}

#[test]
fn test_held_lock_is_live_until_released() {
    let dir = tempdir().unwrap();
    let lock = SessionLock::acquire(dir.path(), &sid()).unwrap();
    let path = lock.path().to_path_buf();

    assert!(path.ends_with("session_20251224_143022_abc1.lock"));
    assert!(probe(&path).unwrap());

    lock.release().unwrap();
    assert!(path.exists());
    assert!(!probe(&path).unwrap());
}

#[test]
fn test_owner_that_opened_before_release_stays_visible() {
    let dir = tempdir().unwrap();
    let first = SessionLock::acquire(dir.path(), &sid()).unwrap();
    let path = first.path().to_path_buf();

    // A second owner opens the path while the first still holds it, then
    // wins the lock once the first releases.
    let second = OpenOptions::new().read(true).write(true).open(&path).unwrap();
    first.release().unwrap();
    second.try_lock_exclusive().unwrap();

    assert!(probe(&path).unwrap());
    assert!(matches!(
        SessionLock::acquire(dir.path(), &sid()),
        Err(StoreError::AlreadyLive { .. })
    ));
    second.unlock().unwrap();
}

#[test]
fn test_acquire_waits_out_a_concurrent_liveness_check() {
    let dir = tempdir().unwrap();
    let path = SessionLock::acquire(dir.path(), &sid())
        .unwrap()
        .path()
        .to_path_buf();

    let (ready_tx, ready_rx) = mpsc::channel();
    let holder = thread::spawn(move || {
        let file = OpenOptions::new().read(true).open(&path).unwrap();
        file.try_lock_shared().unwrap();
        ready_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(30));
        file.unlock().unwrap();
    });
    ready_rx.recv().unwrap();

    let lock = SessionLock::acquire(dir.path(), &sid()).unwrap();
    assert!(probe(lock.path()).unwrap());
    holder.join().unwrap();
}

#[test]
fn test_second_acquire_reports_already_live() {
    let dir = tempdir().unwrap();
    let _held = SessionLock::acquire(dir.path(), &sid()).unwrap();

    match SessionLock::acquire(dir.path(), &sid()) {
        Err(StoreError::AlreadyLive { id }) => assert_eq!(id, "20251224_143022_abc1"),
        other => panic!("expected AlreadyLive, got {:?}", other),
    }
}

#[test]
fn test_dropped_lock_leaves_stale_file_that_is_not_live() {
    let dir = tempdir().unwrap();
    let path = {
        let lock = SessionLock::acquire(dir.path(), &sid()).unwrap();
        lock.path().to_path_buf()
    };
    assert!(path.exists());
    assert!(!probe(&path).unwrap());

    let again = SessionLock::acquire(dir.path(), &sid()).unwrap();
    assert_eq!(again.session_id(), &sid());
    let pid = std::fs::read_to_string(again.path()).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
}
