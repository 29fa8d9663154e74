// SPDX-License-Identifier: MIT

//! govd: the registry governance daemon
//!
//! Wires the coordinator to the in-memory registry backend, the local
//! filesystem driver, and the capturing bus. Runs until ctrl-c; in-flight
//! workers finish naturally.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gov_adapters::{LocalFilesystem, MemoryBus, TokioHost};
use gov_core::SystemClock;
use gov_daemon::pipeline::processors::{CleanDeps, KindLint};
use gov_daemon::{env, Coordinator, CoordinatorConfig, Deps, HandlerRegistry, SyncPolicy};
use gov_store::MemoryRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let handlers = HandlerRegistry::new();
    handlers.register("system.registry:kind_lint", Arc::new(KindLint));
    handlers.register("system.registry:clean_deps", Arc::new(CleanDeps));

    let deps = Deps {
        registry: Arc::new(MemoryRegistry::new()),
        filesystem: Arc::new(LocalFilesystem),
        bus: Arc::new(MemoryBus::new()),
        host: Arc::new(TokioHost::new(env::process_host())),
        handlers: Arc::new(handlers),
        policy: Arc::new(SyncPolicy::default()),
    };

    let cancel = CancellationToken::new();
    let (coordinator, _commands) =
        Coordinator::new(deps, SystemClock, CoordinatorConfig::default(), cancel.clone()).await?;

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    let summary = coordinator.run().await;
    tracing::info!(status = %summary.status, last_version = ?summary.last_version, "daemon exited");
    Ok(())
}
