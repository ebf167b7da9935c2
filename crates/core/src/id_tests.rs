// SPDX-License-Identifier: MIT

use super::*;

crate::define_id! {
    pub struct TestId("tst-");
}

#[test]
fn generates_prefixed_random_id() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), 23);
}

#[test]
fn round_trips_through_string() {
    let id = TestId::from_string("tst-abc");
    assert_eq!(id.as_str(), "tst-abc");
    assert_eq!(id.suffix(), "abc");
}

#[test]
fn short_truncates_suffix() {
    let id = TestId::from_string("tst-abcdefgh");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn serde_round_trip() {
    let id = TestId::from_string("tst-xyz");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tst-xyz\"");
    let parsed: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn two_generated_ids_differ() {
    assert_ne!(TestId::new(), TestId::new());
}

#[test]
fn idbuf_borrow_matches_hashmap_lookup() {
    use std::collections::HashMap;
    let mut map: HashMap<TestId, u32> = HashMap::new();
    let id = TestId::from_string("tst-lookup");
    map.insert(id, 1);
    assert_eq!(map.get("tst-lookup"), Some(&1));
}
