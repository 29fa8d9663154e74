// SPDX-License-Identifier: MIT

//! Envelope shape and backward-compatibility tests.

use super::*;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    apply_changes = { "apply_changes", Operation::ApplyChanges },
    apply_version = { "apply_version", Operation::ApplyVersion },
    upload = { "upload", Operation::Upload },
    download = { "download", Operation::Download },
    get_state = { "get_state", Operation::GetState },
)]
fn operation_parses_known_names(raw: &str, expected: Operation) {
    assert_eq!(Operation::parse(raw), Some(expected));
    assert_eq!(expected.as_str(), raw);
}

#[test]
fn operation_rejects_unknown_names() {
    assert_eq!(Operation::parse("reindex"), None);
}

#[test]
fn get_state_is_the_only_non_mutating_operation() {
    assert!(!Operation::GetState.is_mutating());
    for op in [
        Operation::ApplyChanges,
        Operation::ApplyVersion,
        Operation::Upload,
        Operation::Download,
    ] {
        assert!(op.is_mutating());
    }
}

#[test]
fn minimal_envelope_deserializes_with_defaults() {
    let json = r#"{
        "id": "req-1",
        "operation": "get_state",
        "respond_to": "reply-abc",
        "timestamp": 1700000000
    }"#;
    let decoded: CommandEnvelope = serde_json::from_str(json).expect("deserialize failed");
    assert_eq!(decoded.id, "req-1");
    assert!(decoded.user_id.is_none());
    assert!(decoded.changeset.is_none());
    assert!(decoded.version_id.is_none());
    assert!(decoded.options.is_empty());
}

#[test]
fn envelope_omits_empty_optional_fields() {
    let envelope = CommandEnvelope {
        id: "req-1".to_string(),
        operation: "upload".to_string(),
        respond_to: "reply-abc".to_string(),
        user_id: None,
        timestamp: 1,
        changeset: None,
        version_id: None,
        options: gov_core::Options::new(),
    };
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(
        value,
        json!({
            "id": "req-1",
            "operation": "upload",
            "respond_to": "reply-abc",
            "timestamp": 1,
        })
    );
}
