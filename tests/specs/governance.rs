// SPDX-License-Identifier: MIT

//! Command protocol specs: state reads, applies, mutual exclusion,
//! version validation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use gov_client::{ChangesetBuilder, ClientError};
use gov_core::{Entry, EntryId, Options};
use gov_daemon::{Context, Handler, Verdict};
use gov_store::Registry as _;

use crate::prelude::{version_events, Harness};

#[tokio::test]
async fn get_state_while_idle_mirrors_the_store() {
    let harness = Harness::start().await;

    let state = harness.client.get_state().await.expect("get_state failed");
    assert!(!state.governance.operation_in_progress);
    assert_eq!(state.governance.current_operation, None);
    assert_eq!(
        state.registry.current_version,
        harness.registry.current_version().await.expect("store read failed")
    );
}

#[tokio::test]
async fn create_changeset_applies_and_publishes_one_version_event() {
    let harness = Harness::start().await;

    let mut entry = Entry::new(EntryId::parse("services:api").expect("bad id"), "registry.entry");
    entry.meta.insert("type".into(), json!("service.api"));
    entry.set_data("port", json!(8080));

    let outcome = harness
        .client
        .request_changes(ChangesetBuilder::new().create(&entry), Options::new())
        .await
        .expect("request_changes failed");
    let version = outcome.version.expect("version missing");

    let state = harness.client.get_state().await.expect("get_state failed");
    assert_eq!(state.registry.current_version.as_deref(), Some(version.as_str()));

    let events = version_events(&harness.bus);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["new_version"], version.as_str());
    assert_eq!(events[0]["old_version"], serde_json::Value::Null);
}

/// Holds the change pipeline open so a concurrent call observes `busy`.
struct GateProcessor {
    release: Arc<Notify>,
}

#[async_trait]
impl Handler for GateProcessor {
    async fn invoke(&self, _ctx: &Context) -> Option<Verdict> {
        self.release.notified().await;
        None
    }
}

#[tokio::test]
async fn concurrent_uploads_resolve_to_one_winner_and_one_busy_reply() {
    let temp = tempfile::tempdir().expect("tempdir failed");
    let base = temp.path().join("src");
    std::fs::create_dir_all(base.join("a")).expect("mkdir failed");
    std::fs::write(
        base.join("a/_index.yaml"),
        "version: \"1.0\"\nnamespace: a\n\nentries:\n  - name: x\n    kind: function.lua\n    source: file://x.lua\n",
    )
    .expect("write failed");
    std::fs::write(base.join("a/x.lua"), "return 1").expect("write failed");

    let harness = Harness::start().await;
    let release = Arc::new(Notify::new());
    harness
        .handlers
        .register("sys:gate", Arc::new(GateProcessor { release: Arc::clone(&release) }));
    let mut gate = Entry::new(EntryId::parse("sys:gate").expect("bad id"), "function.lua");
    gate.meta.insert("type".into(), json!("registry.processor"));
    harness.registry.seed([gate]);

    let options = Options::new().with("directory", json!(base.display().to_string()));
    let first_client = harness.client.clone();
    let first_options = options.clone();
    let first = tokio::spawn(async move { first_client.request_upload(first_options).await });

    // Let the first upload reach the gated pipeline stage.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let err = harness.client.request_upload(options).await.expect_err("second upload should fail");
    assert!(err.is_busy(), "unexpected error: {err}");
    match &err {
        ClientError::Rejected { message, .. } => {
            assert_eq!(message, "Operation already in progress: upload");
        }
        other => panic!("expected rejection, got {other}"),
    }

    release.notify_one();
    let outcome = first
        .await
        .expect("join failed")
        .expect("first upload should succeed");
    // The delta creates a:x and drops the processor entry the tree lacks.
    assert!(outcome.version.is_some());
    assert_eq!(outcome.count, Some(2));
}

#[tokio::test]
async fn unknown_version_reports_the_validation_detail() {
    let harness = Harness::start().await;

    let err = harness
        .client
        .request_version("does-not-exist", Options::new())
        .await
        .expect_err("apply of unknown version should fail");
    match err {
        ClientError::Rejected { message, details, .. } => {
            assert_eq!(message, "Failed to validate version ID");
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].id, "version:does-not-exist");
            assert_eq!(details[0].kind, "validation");
            assert_eq!(details[0].message, "Version not found: does-not-exist");
        }
        other => panic!("expected rejection, got {other}"),
    }
}

#[tokio::test]
async fn apply_version_round_trips_recorded_content() {
    let harness = Harness::start().await;
    let entry = crate::prelude::lua_entry("a:x", "return 1");

    let first = harness
        .client
        .request_changes(ChangesetBuilder::new().create(&entry), Options::new())
        .await
        .expect("create failed");
    let v1 = first.version.expect("version missing");

    harness
        .client
        .request_changes(ChangesetBuilder::new().delete(&entry.id), Options::new())
        .await
        .expect("delete failed");
    assert!(harness.registry.snapshot().await.expect("snapshot failed").entries.is_empty());

    let restored = harness
        .client
        .request_version(v1.as_str(), Options::new())
        .await
        .expect("apply_version failed");
    assert!(restored.version.is_some());
    assert_eq!(harness.registry.snapshot().await.expect("snapshot failed").entries.len(), 1);
    // Three applies changed the version three times: three events.
    assert_eq!(version_events(&harness.bus).len(), 3);
}
