// SPDX-License-Identifier: MIT

//! Shared fixtures for daemon tests

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use gov_adapters::{MemoryBus, MemoryFilesystem, ProcessHost, TokioHost};
use gov_core::{Entry, EntryId, FakeClock, Options};
use gov_store::MemoryRegistry;
use gov_wire::{Command, CommandEnvelope, CommandSender, ReplyEnvelope};

use crate::coordinator::{Coordinator, CoordinatorConfig};
use crate::deps::Deps;
use crate::pipeline::HandlerRegistry;
use crate::sync::SyncPolicy;

pub(crate) struct Fixture {
    pub registry: Arc<MemoryRegistry<FakeClock>>,
    pub filesystem: Arc<MemoryFilesystem>,
    pub bus: Arc<MemoryBus>,
    pub handlers: Arc<HandlerRegistry>,
    pub clock: FakeClock,
    pub cancel: CancellationToken,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(MemoryRegistry::with_clock(FakeClock::new())),
            filesystem: Arc::new(MemoryFilesystem::new()),
            bus: Arc::new(MemoryBus::new()),
            handlers: Arc::new(HandlerRegistry::new()),
            clock: FakeClock::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn deps(&self) -> Deps {
        self.deps_with_host(Arc::new(TokioHost::new("app:processes")))
    }

    pub fn deps_with_host(&self, host: Arc<dyn ProcessHost>) -> Deps {
        Deps {
            registry: Arc::clone(&self.registry) as Arc<dyn gov_store::Registry>,
            filesystem: Arc::clone(&self.filesystem) as Arc<dyn gov_adapters::Filesystem>,
            bus: Arc::clone(&self.bus) as Arc<dyn gov_adapters::Bus>,
            host,
            handlers: Arc::clone(&self.handlers),
            policy: Arc::new(SyncPolicy::default()),
        }
    }

    /// Spawn a coordinator over this fixture and hand back the command
    /// sender.
    pub async fn start_coordinator(&self) -> CommandSender {
        self.start_coordinator_with(self.deps()).await
    }

    pub async fn start_coordinator_with(&self, deps: Deps) -> CommandSender {
        let (coordinator, commands) = Coordinator::new(
            deps,
            self.clock.clone(),
            CoordinatorConfig::default(),
            self.cancel.clone(),
        )
        .await
        .expect("coordinator start failed");
        tokio::spawn(coordinator.run());
        commands
    }
}

pub(crate) fn entry(id: &str, kind: &str) -> Entry {
    Entry::new(EntryId::parse(id).expect("bad id"), kind)
}

pub(crate) fn lua_entry(id: &str, source: &str) -> Entry {
    let mut e = entry(id, "function.lua");
    e.set_data("source", json!(source));
    e
}

pub(crate) fn create_op(entry: &Entry) -> Value {
    json!({"kind": "entry.create", "entry": entry})
}

/// Send one command and wait for its reply.
pub(crate) async fn roundtrip(
    commands: &CommandSender,
    operation: &str,
    changeset: Option<Vec<Value>>,
    version_id: Option<String>,
    options: Options,
) -> ReplyEnvelope {
    let (reply_tx, mut reply_rx) = mpsc::channel(1);
    let envelope = CommandEnvelope {
        id: format!("req-{}", next_suffix()),
        operation: operation.to_string(),
        respond_to: format!("reply-{}", next_suffix()),
        user_id: None,
        timestamp: 0,
        changeset,
        version_id,
        options,
    };
    commands
        .send(Command { envelope, reply: reply_tx })
        .await
        .expect("coordinator gone");
    reply_rx.recv().await.expect("no reply")
}

fn next_suffix() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(0);
    NEXT.fetch_add(1, Ordering::Relaxed).to_string()
}
