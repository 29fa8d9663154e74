// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use gov_core::FakeClock;
use gov_store::MemoryRegistry;

use super::*;
use crate::test_helpers::entry;

struct Noop;

#[async_trait]
impl Handler for Noop {
    async fn invoke(&self, _ctx: &Context) -> Option<Verdict> {
        None
    }
}

fn extension_entry(id: &str, meta_type: &str, priority: i64) -> gov_core::Entry {
    let mut e = entry(id, "function.lua");
    e.meta.insert("type".into(), json!(meta_type));
    if priority != 0 {
        e.meta.insert("priority".into(), json!(priority));
    }
    e
}

#[tokio::test]
async fn discover_orders_by_priority_then_id() {
    let registry = MemoryRegistry::with_clock(FakeClock::new());
    registry.seed([
        extension_entry("sys:a", PROCESSOR_TYPE, 10),
        extension_entry("sys:b", PROCESSOR_TYPE, 5),
        extension_entry("sys:c", PROCESSOR_TYPE, 20),
        extension_entry("sys:tie2", PROCESSOR_TYPE, 5),
    ]);

    let found = discover(&registry, PROCESSOR_TYPE).await.unwrap();
    let ids: Vec<_> = found.iter().map(|e| e.id.to_string()).collect();
    assert_eq!(ids, vec!["sys:b", "sys:tie2", "sys:a", "sys:c"]);
}

#[tokio::test]
async fn discover_separates_processors_from_listeners() {
    let registry = MemoryRegistry::with_clock(FakeClock::new());
    registry.seed([
        extension_entry("sys:p", PROCESSOR_TYPE, 0),
        extension_entry("sys:l", LISTENER_TYPE, 0),
    ]);

    let processors = discover(&registry, PROCESSOR_TYPE).await.unwrap();
    assert_eq!(processors.len(), 1);
    assert_eq!(processors[0].id.to_string(), "sys:p");
    let listeners = discover(&registry, LISTENER_TYPE).await.unwrap();
    assert_eq!(listeners.len(), 1);
}

#[tokio::test]
async fn installing_an_extension_takes_effect_immediately() {
    let registry = MemoryRegistry::with_clock(FakeClock::new());
    assert!(discover(&registry, PROCESSOR_TYPE).await.unwrap().is_empty());

    // Nothing is cached: the next discovery sees the new entry.
    registry.seed([extension_entry("sys:new", PROCESSOR_TYPE, 0)]);
    assert_eq!(discover(&registry, PROCESSOR_TYPE).await.unwrap().len(), 1);
}

#[test]
fn handler_registry_resolves_registered_ids() {
    let handlers = HandlerRegistry::new();
    handlers.register("sys:noop", Arc::new(Noop));
    assert!(handlers.resolve("sys:noop").is_some());
    assert!(handlers.resolve("sys:other").is_none());
}
