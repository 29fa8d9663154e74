// SPDX-License-Identifier: MIT

//! Processor/listener discovery and dispatch
//!
//! Extensions live in the entry store as entries with
//! `meta.type = registry.processor` or `registry.listener`. Discovery
//! re-queries the store on every pipeline run — nothing is cached — so
//! installing a processor takes effect immediately. Invocation goes through
//! a handler registry keyed by entry id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use gov_core::Entry;
use gov_store::{Registry, StoreError};
use gov_wire::Detail;

use crate::pipeline::context::Context;

pub const PROCESSOR_TYPE: &str = "registry.processor";
pub const LISTENER_TYPE: &str = "registry.listener";

/// What an extension reports back to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Verdict {
    pub success: bool,
    pub message: Option<String>,
    pub details: Vec<Detail>,
    /// Keys merged into the context and the final result. `options` and
    /// `user_id` are restored after the step.
    pub extra: Map<String, Value>,
}

impl Verdict {
    pub fn ok() -> Self {
        Self { success: true, ..Self::default() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()), ..Self::default() }
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.details.push(detail);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// An invocable extension. Returning `None` means "no change".
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, ctx: &Context) -> Option<Verdict>;
}

/// Maps extension entry ids to invocable handlers.
///
/// Populated at startup; which handlers actually run on a given pipeline
/// pass is decided by store discovery, not by this registry.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.write().insert(id.into(), handler);
    }

    pub fn resolve(&self, id: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.read().get(id).cloned()
    }
}

/// Fetch extensions of the given meta-type, ordered by ascending
/// `meta.priority` (default 0) with ties broken by id.
pub async fn discover(registry: &dyn Registry, meta_type: &str) -> Result<Vec<Entry>, StoreError> {
    let mut entries = registry.find(meta_type).await?;
    entries.sort_by(|a, b| {
        a.priority()
            .cmp(&b.priority())
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(entries)
}

#[cfg(test)]
#[path = "extensions_tests.rs"]
mod tests;
