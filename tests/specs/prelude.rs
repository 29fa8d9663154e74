// SPDX-License-Identifier: MIT

//! Shared harness for the end-to-end specs

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use gov_adapters::{AllowAll, Filesystem, LocalFilesystem, MemoryBus, TokioHost};
use gov_client::Client;
use gov_core::{Entry, EntryId, FakeClock};
use gov_daemon::{Coordinator, CoordinatorConfig, Deps, HandlerRegistry, SyncPolicy};
use gov_store::MemoryRegistry;

pub struct Harness {
    pub registry: Arc<MemoryRegistry<FakeClock>>,
    pub bus: Arc<MemoryBus>,
    pub handlers: Arc<HandlerRegistry>,
    pub client: Client<FakeClock>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with_fs(Arc::new(LocalFilesystem)).await
    }

    pub async fn start_with_fs(filesystem: Arc<dyn Filesystem>) -> Self {
        let registry = Arc::new(MemoryRegistry::with_clock(FakeClock::new()));
        let bus = Arc::new(MemoryBus::new());
        let handlers = Arc::new(HandlerRegistry::new());
        let deps = Deps {
            registry: Arc::clone(&registry) as Arc<dyn gov_store::Registry>,
            filesystem,
            bus: Arc::clone(&bus) as Arc<dyn gov_adapters::Bus>,
            host: Arc::new(TokioHost::new("app:processes")),
            handlers: Arc::clone(&handlers),
            policy: Arc::new(SyncPolicy::default()),
        };

        let (coordinator, commands) = Coordinator::new(
            deps,
            FakeClock::new(),
            CoordinatorConfig::default(),
            CancellationToken::new(),
        )
        .await
        .expect("coordinator start failed");
        tokio::spawn(coordinator.run());

        let client = Client::with_clock(commands, Arc::new(AllowAll), FakeClock::new());
        Self { registry, bus, handlers, client }
    }
}

pub fn lua_entry(id: &str, source: &str) -> Entry {
    let mut entry = Entry::new(EntryId::parse(id).expect("bad id"), "function.lua");
    entry.set_data("source", json!(source));
    entry
}

pub fn version_events(bus: &MemoryBus) -> Vec<serde_json::Value> {
    bus.published()
        .into_iter()
        .filter(|p| p.event == "registry:version")
        .map(|p| p.payload)
        .collect()
}
