// SPDX-License-Identifier: MIT

//! External collaborators wired into the coordinator and its workers

use std::sync::Arc;

use gov_adapters::{Bus, Filesystem, ProcessHost};
use gov_store::Registry;

use crate::pipeline::HandlerRegistry;
use crate::sync::SyncPolicy;

/// Shared handles to the external collaborators. Workers receive a clone;
/// none of these carry governance state.
#[derive(Clone)]
pub struct Deps {
    pub registry: Arc<dyn Registry>,
    pub filesystem: Arc<dyn Filesystem>,
    pub bus: Arc<dyn Bus>,
    pub host: Arc<dyn ProcessHost>,
    pub handlers: Arc<HandlerRegistry>,
    pub policy: Arc<SyncPolicy>,
}
