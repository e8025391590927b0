//! Tests for session identity.

use super::*;
use chrono::TimeZone;

#[test]
fn test_generate_is_canonical() {
    let now = Local.with_ymd_and_hms(2025, 12, 17, 20, 51, 6).unwrap();
    let id = SessionId::generate(now);

    assert!(id.as_str().starts_with("20251217_205106_"));
    assert!(id.is_canonical(), "generated id {} not canonical", id);
    assert_eq!(id.short_id().len(), SHORT_ID_LEN);
}

#[test]
fn test_generated_ids_sort_by_creation_time() {
    let earlier = SessionId::generate(Local.with_ymd_and_hms(2025, 12, 17, 20, 51, 6).unwrap());
    let later = SessionId::generate(Local.with_ymd_and_hms(2025, 12, 18, 8, 0, 0).unwrap());
    assert!(earlier < later);
}

#[test]
fn test_short_id_is_trailing_suffix() {
    let id = SessionId::parse("20251217_205106_a7b3").unwrap();
    assert_eq!(id.short_id(), "a7b3");
}

#[test]
fn test_short_id_of_short_legacy_id() {
    let id = SessionId::parse("abc").unwrap();
    assert_eq!(id.short_id(), "abc");
}

#[test]
fn test_parse_rejects_blank() {
    assert!(SessionId::parse("").is_none());
    assert!(SessionId::parse("   ").is_none());
}

#[test]
fn test_parse_rejects_ids_that_leave_the_store() {
    for raw in ["../evil", "..", "a/b", "a\\b", "x\0y", "/etc/passwd"] {
        assert!(SessionId::parse(raw).is_none(), "accepted {:?}", raw);
    }
    assert!(SessionId::parse("20251224_120000_a.b").is_some());
}

#[test]
fn test_deserialize_validates_ids() {
    let id: SessionId = serde_json::from_str("\"20251217_205106_a7b3\"").unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"20251217_205106_a7b3\"");

    let err = serde_json::from_str::<SessionId>("\"../../outside\"").unwrap_err();
    assert!(err.to_string().contains("invalid session id"));
    assert!(serde_json::from_str::<SessionId>("\"\"").is_err());
}

#[test]
fn test_legacy_ids_are_not_canonical() {
    let id = SessionId::parse("20251224_120000_delete").unwrap();
    assert!(!id.is_canonical());
}

#[test]
fn test_session_type_roundtrips_unknown_kinds() {
    let json = serde_json::to_string(&SessionType::Other("cli".to_string())).unwrap();
    assert_eq!(json, "\"cli\"");
    let parsed: SessionType = serde_json::from_str("\"browser\"").unwrap();
    assert_eq!(parsed, SessionType::Browser);
}

#[test]
fn test_validate_rejects_end_before_start() {
    let started = Utc.with_ymd_and_hms(2025, 12, 17, 20, 0, 0).unwrap();
    let mut session = Session::new_browser(SessionId::parse("s1").unwrap(), started);
    assert!(session.validate().is_ok());

    session.ended_at = Some(started - chrono::Duration::minutes(5));
    let err = session.validate().unwrap_err();
    assert!(err.contains("before started_at"));
}

#[test]
fn test_session_record_json_shape() {
    let started = Utc.with_ymd_and_hms(2025, 12, 17, 20, 51, 6).unwrap();
    let session = Session::new_browser(SessionId::parse("20251217_205106_a7b3").unwrap(), started);
    let value = serde_json::to_value(&session).unwrap();

    assert_eq!(value["id"], "20251217_205106_a7b3");
    assert_eq!(value["type"], "browser");
    assert!(value["ended_at"].is_null());
}
