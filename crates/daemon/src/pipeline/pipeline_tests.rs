// SPDX-License-Identifier: MIT

//! Whole-pipeline behavior: processor ordering, context discipline,
//! listener fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use gov_core::Options;
use gov_store::Registry;
use gov_wire::Detail;

use super::*;
use crate::test_helpers::{create_op, entry, lua_entry, Fixture};

/// Handler that records its id when invoked.
struct Recording {
    id: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    verdict: Option<Verdict>,
}

#[async_trait]
impl Handler for Recording {
    async fn invoke(&self, _ctx: &Context) -> Option<Verdict> {
        self.log.lock().push(self.id.to_string());
        self.verdict.clone()
    }
}

/// Handler that snapshots the options/user it observed.
struct Observing {
    seen: Arc<Mutex<Vec<(Option<String>, Option<String>)>>>,
    verdict: Option<Verdict>,
}

#[async_trait]
impl Handler for Observing {
    async fn invoke(&self, ctx: &Context) -> Option<Verdict> {
        self.seen.lock().push((
            ctx.options.directory().map(str::to_string),
            ctx.user_id.clone(),
        ));
        self.verdict.clone()
    }
}

fn extension(id: &str, meta_type: &str, priority: i64) -> gov_core::Entry {
    let mut e = entry(id, "function.lua");
    e.meta.insert("type".into(), json!(meta_type));
    e.meta.insert("priority".into(), json!(priority));
    e
}

fn input(changeset: Vec<serde_json::Value>) -> PipelineInput {
    PipelineInput {
        raw_changeset: Some(changeset),
        version_id: None,
        options: Options::new().with("directory", json!("/src")),
        user_id: Some("alice".to_string()),
        request_id: "req-1".to_string(),
    }
}

#[tokio::test]
async fn processors_run_in_ascending_priority_order() {
    let fixture = Fixture::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    fixture.registry.seed([
        extension("sys:a", PROCESSOR_TYPE, 10),
        extension("sys:b", PROCESSOR_TYPE, 5),
        extension("sys:c", PROCESSOR_TYPE, 20),
    ]);
    for id in ["sys:a", "sys:b", "sys:c"] {
        fixture
            .handlers
            .register(id, Arc::new(Recording { id, log: Arc::clone(&log), verdict: None }));
    }

    let result = run(&fixture.deps(), input(vec![create_op(&lua_entry("a:x", "return 1"))]))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(*log.lock(), vec!["sys:b", "sys:a", "sys:c"]);
}

#[tokio::test]
async fn options_overwrites_do_not_leak_but_custom_keys_do() {
    let fixture = Fixture::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    fixture.registry.seed([
        extension("sys:mutator", PROCESSOR_TYPE, 1),
        extension("sys:observer", PROCESSOR_TYPE, 2),
    ]);
    fixture.handlers.register(
        "sys:mutator",
        Arc::new(Recording {
            id: "sys:mutator",
            log: Arc::new(Mutex::new(Vec::new())),
            verdict: Some(
                Verdict::ok()
                    .with_extra("options", json!({"directory": "/evil"}))
                    .with_extra("user_id", json!("mallory"))
                    .with_extra("audit_tag", json!("batch-7")),
            ),
        }),
    );
    fixture.handlers.register(
        "sys:observer",
        Arc::new(Observing { seen: Arc::clone(&seen), verdict: None }),
    );

    let result = run(&fixture.deps(), input(vec![create_op(&lua_entry("a:x", "return 1"))]))
        .await
        .unwrap();
    assert!(result.success);

    // The next processor still observes the original options and user.
    let observed = seen.lock().clone();
    assert_eq!(observed, vec![(Some("/src".to_string()), Some("alice".to_string()))]);

    // The custom key is visible to the client.
    assert_eq!(result.extra["audit_tag"], "batch-7");
}

#[tokio::test]
async fn failing_processor_aborts_with_its_verdict_and_keeps_details() {
    let fixture = Fixture::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    fixture.registry.seed([
        extension("sys:warn", PROCESSOR_TYPE, 1),
        extension("sys:block", PROCESSOR_TYPE, 2),
        extension("sys:after", PROCESSOR_TYPE, 3),
    ]);
    fixture.handlers.register(
        "sys:warn",
        Arc::new(Recording {
            id: "sys:warn",
            log: Arc::clone(&log),
            verdict: Some(Verdict::ok().with_detail(Detail::warning("a:x", "looks odd"))),
        }),
    );
    fixture.handlers.register(
        "sys:block",
        Arc::new(Recording {
            id: "sys:block",
            log: Arc::clone(&log),
            verdict: Some(
                Verdict::fail("Blocked by policy").with_detail(Detail::error("a:x", "rejected")),
            ),
        }),
    );
    fixture.handlers.register(
        "sys:after",
        Arc::new(Recording { id: "sys:after", log: Arc::clone(&log), verdict: None }),
    );

    let result = run(&fixture.deps(), input(vec![create_op(&lua_entry("a:x", "return 1"))]))
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("processor_failure"));
    assert_eq!(result.message, "Blocked by policy");
    // Details from before the failure survive.
    let kinds: Vec<_> = result.details.iter().map(|d| d.kind.as_str()).collect();
    assert_eq!(kinds, vec!["warning", "error"]);
    // The chain stopped at the failing processor.
    assert_eq!(*log.lock(), vec!["sys:warn", "sys:block"]);
    // Nothing was applied.
    assert_eq!(fixture.registry.current_version().await.unwrap(), None);
}

#[tokio::test]
async fn unregistered_processor_fails_the_pipeline() {
    let fixture = Fixture::new();
    fixture.registry.seed([extension("sys:ghost", PROCESSOR_TYPE, 0)]);

    let result = run(&fixture.deps(), input(vec![create_op(&lua_entry("a:x", "return 1"))]))
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("processor_failure"));
    assert_eq!(result.message, "Processor not registered: sys:ghost");
}

#[tokio::test]
async fn listener_failures_do_not_affect_the_reply() {
    let fixture = Fixture::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    fixture.registry.seed([extension("sys:audit", LISTENER_TYPE, 0)]);
    fixture.handlers.register(
        "sys:audit",
        Arc::new(Recording {
            id: "sys:audit",
            log: Arc::clone(&log),
            verdict: Some(Verdict::fail("audit sink is down")),
        }),
    );

    let result = run(&fixture.deps(), input(vec![create_op(&lua_entry("a:x", "return 1"))]))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.message, "Changes applied successfully");
    // The listener ran, exactly once.
    assert_eq!(*log.lock(), vec!["sys:audit"]);
}

#[tokio::test]
async fn listeners_do_not_run_when_execution_fails() {
    let fixture = Fixture::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    fixture.registry.seed([extension("sys:audit", LISTENER_TYPE, 0)]);
    fixture.handlers.register(
        "sys:audit",
        Arc::new(Recording { id: "sys:audit", log: Arc::clone(&log), verdict: None }),
    );

    // Version apply path: no changeset, so listeners stay silent even on
    // success — and certainly on a validation failure.
    let result = run(
        &fixture.deps(),
        PipelineInput {
            raw_changeset: None,
            version_id: Some("v9".to_string()),
            options: Options::new(),
            user_id: None,
            request_id: "req-1".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(!result.success);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn processor_transformed_changeset_reaches_the_executor() {
    let fixture = Fixture::new();
    fixture.registry.seed([extension("sys:rewrite", PROCESSOR_TYPE, 0)]);
    fixture.handlers.register(
        "sys:rewrite",
        Arc::new(Recording {
            id: "sys:rewrite",
            log: Arc::new(Mutex::new(Vec::new())),
            verdict: Some(Verdict::ok().with_extra(
                "changeset",
                json!([{"kind": "entry.create", "entry": {"id": "a:rewritten", "kind": "function.lua"}}]),
            )),
        }),
    );

    let result = run(&fixture.deps(), input(vec![create_op(&lua_entry("a:original", "return 1"))]))
        .await
        .unwrap();
    assert!(result.success);

    // The executor saw the processor's output, not the client's input.
    let snapshot = fixture.registry.snapshot().await.unwrap();
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.entries[0].id.to_string(), "a:rewritten");
    let executed = result.changeset.expect("executed changeset missing");
    assert_eq!(executed[0].id().to_string(), "a:rewritten");
}
