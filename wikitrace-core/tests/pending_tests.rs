// Tests for pending intent bookkeeping

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use wikitrace_core::{ConsumeOutcome, EdgeTimeoutMap, PageTitle};

fn t(ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 24, 14, 55, 0).unwrap() + TimeDelta::milliseconds(ms)
}

fn title(s: &str) -> PageTitle {
    PageTitle::new(s).unwrap()
}

const WINDOW_MS: i64 = 10_000;

fn window() -> TimeDelta {
    TimeDelta::milliseconds(WINDOW_MS)
}

// ============================================================================
// Consume Tests
// ============================================================================

#[test]
fn test_consume_within_window_matches() {
    let mut map = EdgeTimeoutMap::new();
    map.record("/wiki/Cat", title("Dog"), t(0));

    match map.try_consume("/wiki/Cat", t(3_000), window()) {
        ConsumeOutcome::Matched(intent) => {
            assert_eq!(intent.origin_title, title("Dog"));
            assert_eq!(intent.recorded_at, t(0));
        }
        other => panic!("expected a match, got {:?}", other),
    }
    assert!(map.is_empty());
}

#[test]
fn test_consume_at_exact_window_matches() {
    let mut map = EdgeTimeoutMap::new();
    map.record("/wiki/Cat", title("Dog"), t(0));

    assert!(matches!(
        map.try_consume("/wiki/Cat", t(WINDOW_MS), window()),
        ConsumeOutcome::Matched(_)
    ));
}

#[test]
fn test_consume_after_window_expires_then_not_found() {
    let mut map = EdgeTimeoutMap::new();
    map.record("/wiki/Cat", title("Dog"), t(0));

    assert!(matches!(
        map.try_consume("/wiki/Cat", t(WINDOW_MS + 1), window()),
        ConsumeOutcome::Expired(_)
    ));
    assert_eq!(
        map.try_consume("/wiki/Cat", t(WINDOW_MS + 2), window()),
        ConsumeOutcome::NotFound
    );
}

#[test]
fn test_consume_unknown_target() {
    let mut map = EdgeTimeoutMap::new();
    map.record("/wiki/Cat", title("Dog"), t(0));

    assert_eq!(
        map.try_consume("/wiki/Fish", t(10), window()),
        ConsumeOutcome::NotFound
    );
    assert_eq!(map.len(), 1);
}

#[test]
fn test_completion_stamped_before_intent_matches() {
    let mut map = EdgeTimeoutMap::new();
    map.record("/wiki/Cat", title("Dog"), t(5_000));

    assert!(matches!(
        map.try_consume("/wiki/Cat", t(4_000), window()),
        ConsumeOutcome::Matched(_)
    ));
}

// ============================================================================
// Record Tests
// ============================================================================

#[test]
fn test_record_replaces_previous_intent() {
    let mut map = EdgeTimeoutMap::new();
    assert!(map.record("/wiki/Cat", title("Dog"), t(0)).is_none());

    let replaced = map.record("/wiki/Cat", title("Fish"), t(1_000)).unwrap();
    assert_eq!(replaced.origin_title, title("Dog"));
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("/wiki/Cat").unwrap().origin_title, title("Fish"));
}

#[test]
fn test_record_refreshes_expired_entry() {
    let mut map = EdgeTimeoutMap::new();
    map.record("/wiki/Cat", title("Dog"), t(0));
    map.record("/wiki/Cat", title("Dog"), t(20_000));

    assert!(matches!(
        map.try_consume("/wiki/Cat", t(21_000), window()),
        ConsumeOutcome::Matched(_)
    ));
}

#[test]
fn test_targets_and_clear() {
    let mut map = EdgeTimeoutMap::new();
    map.record("/wiki/Cat", title("Dog"), t(0));
    map.record("/wiki/Bird", title("Dog"), t(0));

    let targets: Vec<&str> = map.targets().collect();
    assert_eq!(targets, vec!["/wiki/Bird", "/wiki/Cat"]);

    assert!(map.remove("/wiki/Bird").is_some());
    map.clear();
    assert!(map.is_empty());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[test]
fn test_serialize_and_restore() {
    let mut map = EdgeTimeoutMap::new();
    map.record("/wiki/Cat", title("Dog"), t(0));

    let blob = map.serialize().unwrap();
    assert!(blob.contains("originTitle"));
    assert!(blob.contains("recordedAt"));

    let restored = EdgeTimeoutMap::deserialize(Some(&blob));
    assert_eq!(restored, map);
}

#[test]
fn test_deserialize_missing_or_malformed_is_empty() {
    assert!(EdgeTimeoutMap::deserialize(None).is_empty());
    assert!(EdgeTimeoutMap::deserialize(Some("not json")).is_empty());
    assert!(EdgeTimeoutMap::deserialize(Some(r#"{"/wiki/Cat":{"originTitle":""}}"#)).is_empty());
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_expiry_law(age_ms in 0i64..100_000, window_ms in 0i64..50_000) {
        let mut map = EdgeTimeoutMap::new();
        map.record("/wiki/Cat", title("Dog"), t(0));

        let outcome = map.try_consume("/wiki/Cat", t(age_ms), TimeDelta::milliseconds(window_ms));
        if age_ms > window_ms {
            prop_assert!(matches!(outcome, ConsumeOutcome::Expired(_)));
        } else {
            prop_assert!(matches!(outcome, ConsumeOutcome::Matched(_)));
        }
        prop_assert_eq!(
            map.try_consume("/wiki/Cat", t(age_ms), TimeDelta::milliseconds(window_ms)),
            ConsumeOutcome::NotFound
        );
    }
}
