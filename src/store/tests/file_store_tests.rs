//! Tests for the file-backed session store.

use super::*;
use chrono::{Duration, TimeZone};
use tempfile::tempdir;

fn sid(raw: &str) -> SessionId {
    SessionId::parse(raw).unwrap()
}

fn started() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 17, 20, 51, 6).unwrap()
}

#[test]
fn test_list_without_sessions_dir_is_schema_missing() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());

    let err = store.list().unwrap_err();
    assert!(err.is_schema_missing());
    assert!(store.get_active_session().unwrap().is_none());
}

#[test]
fn test_save_find_and_list() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    let b = Session::new_browser(sid("20251218_205106_bbbb"), started());
    let a = Session::new_browser(sid("20251217_205106_a7b3"), started());
    store.save(&b).unwrap();
    store.save(&a).unwrap();

    assert_eq!(store.find(&a.id).unwrap(), Some(a.clone()));
    assert!(store.find(&sid("missing")).unwrap().is_none());

    let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id.to_string()).collect();
    assert_eq!(ids, vec!["20251217_205106_a7b3", "20251218_205106_bbbb"]);
}

#[test]
fn test_list_skips_unreadable_records() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    store
        .save(&Session::new_browser(sid("20251217_205106_a7b3"), started()))
        .unwrap();
    std::fs::write(paths::session_record_path(dir.path(), "broken"), "{oops").unwrap();
    std::fs::write(paths::sessions_dir(dir.path()).join("notes.txt"), "ignored").unwrap();

    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_list_skips_records_with_unsafe_ids() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    store
        .save(&Session::new_browser(sid("20251217_205106_a7b3"), started()))
        .unwrap();
    let record = std::fs::read_to_string(paths::session_record_path(dir.path(), "20251217_205106_a7b3"))
        .unwrap()
        .replace("20251217_205106_a7b3", "../../outside");
    std::fs::write(paths::session_record_path(dir.path(), "planted"), record).unwrap();

    let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id.to_string()).collect();
    assert_eq!(ids, vec!["20251217_205106_a7b3"]);
}

#[test]
fn test_save_rejects_invalid_record() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    let mut session = Session::new_browser(sid("20251217_205106_a7b3"), started());
    session.ended_at = Some(started() - Duration::hours(1));

    assert!(matches!(store.save(&session), Err(StoreError::Invalid { .. })));
}

#[test]
fn test_state_roundtrip_and_missing_state() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    let id = sid("20251217_205106_a7b3");
    assert!(store.get_state(&id).unwrap().is_none());

    let state = SessionState::from_uris(id.clone(), &["https://a.example".to_string()]);
    store.save_state(&state).unwrap();

    assert_eq!(store.get_state(&id).unwrap(), Some(state.clone()));
    assert_eq!(store.get_state_strict(&id).unwrap(), Some(state));
    assert!(!paths::snapshot_path(dir.path(), id.as_str())
        .with_extension("json.tmp")
        .exists());
}

#[test]
fn test_corrupt_and_malformed_state() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    std::fs::create_dir_all(paths::snapshots_dir(dir.path())).unwrap();

    let corrupt = sid("corrupt");
    std::fs::write(paths::snapshot_path(dir.path(), corrupt.as_str()), "not json").unwrap();
    assert!(matches!(store.get_state(&corrupt), Err(StoreError::Corrupt { .. })));

    let malformed = sid("malformed");
    std::fs::write(
        paths::snapshot_path(dir.path(), malformed.as_str()),
        r#"{"session_id": "malformed", "tabs": [{"workspace": {"root": {"id": "r"}}}]}"#,
    )
    .unwrap();
    assert_eq!(store.get_state(&malformed).unwrap().unwrap().pane_count(), 0);
    match store.get_state_strict(&malformed) {
        Err(StoreError::Invalid { id, reason }) => {
            assert_eq!(id, "malformed");
            assert!(reason.starts_with("tab[0]/root"));
        }
        other => panic!("expected Invalid, got {:?}", other),
    }
}

#[test]
fn test_mark_ended() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    let session = Session::new_browser(sid("20251217_205106_a7b3"), started());
    store.save(&session).unwrap();

    let ended = started() + Duration::minutes(30);
    store.mark_ended(&session.id, ended).unwrap();
    assert_eq!(store.find(&session.id).unwrap().unwrap().ended_at, Some(ended));

    assert!(matches!(
        store.mark_ended(&sid("missing"), ended),
        Err(StoreError::Invalid { .. })
    ));
}

#[test]
fn test_delete_snapshot_removes_record_and_state() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    let session = Session::new_browser(sid("20251217_205106_a7b3"), started());
    store.save(&session).unwrap();
    store
        .save_state(&SessionState::empty(session.id.clone()))
        .unwrap();

    store.delete_snapshot(&session.id).unwrap();
    assert!(store.find(&session.id).unwrap().is_none());
    assert!(store.get_state(&session.id).unwrap().is_none());

    // Deleting again is not an error.
    store.delete_snapshot(&session.id).unwrap();
}

#[test]
fn test_liveness_and_active_session() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    let older = Session::new_browser(sid("20251217_205106_a7b3"), started());
    let newer = Session::new_browser(sid("20251218_205106_bbbb"), started() + Duration::days(1));
    store.save(&older).unwrap();
    store.save(&newer).unwrap();

    assert!(!store.is_live(&older.id));
    assert!(store.get_active_session().unwrap().is_none());

    let lock = store.acquire_lock(&older.id).unwrap();
    assert!(store.is_live(&older.id));
    assert!(!store.is_live(&newer.id));
    assert_eq!(store.get_active_session().unwrap(), Some(older.clone()));

    lock.release().unwrap();
    assert!(!store.is_live(&older.id));
}

#[test]
fn test_delete_snapshot_keeps_record_when_snapshot_removal_fails() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    let session = Session::new_browser(sid("20251217_205106_a7b3"), started());
    store.save(&session).unwrap();
    // A directory in the snapshot's place cannot be removed as a file.
    let snapshot = paths::snapshot_path(dir.path(), session.id.as_str());
    std::fs::create_dir_all(snapshot.join("inner")).unwrap();

    assert!(matches!(store.delete_snapshot(&session.id), Err(StoreError::Io { .. })));
    assert_eq!(store.find(&session.id).unwrap(), Some(session));
}

#[test]
fn test_delete_snapshot_leaves_lock_file_in_place() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    let session = Session::new_browser(sid("20251217_205106_a7b3"), started());
    store.save(&session).unwrap();
    store.acquire_lock(&session.id).unwrap().release().unwrap();

    store.delete_snapshot(&session.id).unwrap();
    assert!(store.lock_path(&session.id).exists());
}
