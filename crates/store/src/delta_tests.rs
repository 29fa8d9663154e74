// SPDX-License-Identifier: MIT

use super::*;
use gov_core::ChangeKind;
use proptest::prelude::*;
use serde_json::json;

fn entry(id: &str, kind: &str, source: &str) -> Entry {
    let mut e = Entry::new(gov_core::EntryId::parse(id).unwrap(), kind);
    e.set_data("source", json!(source));
    e
}

#[test]
fn identical_sets_produce_empty_delta() {
    let a = vec![entry("a:x", "function.lua", "return 1")];
    assert!(build_delta(&a, &a.clone()).is_empty());
}

#[test]
fn detects_create_update_delete() {
    let current = vec![
        entry("a:keep", "function.lua", "return 1"),
        entry("a:change", "function.lua", "return 2"),
        entry("a:drop", "function.lua", "return 3"),
    ];
    let target = vec![
        entry("a:keep", "function.lua", "return 1"),
        entry("a:change", "function.lua", "return 20"),
        entry("a:new", "function.lua", "return 4"),
    ];
    let delta = build_delta(&current, &target);
    let kinds: Vec<_> = delta.iter().map(|op| (op.kind(), op.id().to_string())).collect();
    assert_eq!(
        kinds,
        vec![
            (ChangeKind::Create, "a:new".to_string()),
            (ChangeKind::Update, "a:change".to_string()),
            (ChangeKind::Delete, "a:drop".to_string()),
        ]
    );
}

#[test]
fn kind_change_is_an_update() {
    let current = vec![entry("a:x", "function.lua", "return 1")];
    let target = vec![entry("a:x", "library.lua", "return 1")];
    let delta = build_delta(&current, &target);
    assert_eq!(delta.len(), 1);
    assert_eq!(delta[0].kind(), ChangeKind::Update);
}

#[test]
fn output_is_sorted_by_id_within_each_kind() {
    let target = vec![
        entry("b:y", "function.lua", "1"),
        entry("a:x", "function.lua", "1"),
        entry("c:z", "function.lua", "1"),
    ];
    let delta = build_delta(&[], &target);
    let ids: Vec<_> = delta.iter().map(|op| op.id().to_string()).collect();
    assert_eq!(ids, vec!["a:x", "b:y", "c:z"]);
}

/// Apply a delta to an entry set the way a store would.
fn apply(delta: &Changeset, current: &[Entry]) -> Vec<Entry> {
    let mut map: BTreeMap<String, Entry> =
        current.iter().map(|e| (e.id.to_string(), e.clone())).collect();
    for op in delta {
        match op {
            ChangeOp::Create { entry } | ChangeOp::Update { entry } => {
                map.insert(entry.id.to_string(), entry.clone());
            }
            ChangeOp::Delete { entry } => {
                map.remove(&entry.id.to_string());
            }
        }
    }
    map.into_values().collect()
}

fn arb_entry_set() -> impl Strategy<Value = Vec<Entry>> {
    let names = prop::sample::subsequence(
        vec!["a", "b", "c", "d", "e", "f", "g", "h"],
        0..=8,
    );
    (names, prop::collection::vec(0u8..4, 8)).prop_map(|(names, bodies)| {
        names
            .into_iter()
            .zip(bodies)
            .map(|(name, body)| entry(&format!("ns:{name}"), "function.lua", &format!("return {body}")))
            .collect()
    })
}

proptest! {
    /// The delta between two sets, applied to the first, yields the second.
    #[test]
    fn delta_applied_to_current_yields_target(
        current in arb_entry_set(),
        target in arb_entry_set(),
    ) {
        let delta = build_delta(&current, &target);
        let mut applied = apply(&delta, &current);
        let mut expected = target.clone();
        applied.sort_by(|a, b| a.id.cmp(&b.id));
        expected.sort_by(|a, b| a.id.cmp(&b.id));
        prop_assert_eq!(applied, expected);
    }
}
