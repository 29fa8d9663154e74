// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gov-daemon: The registry governance coordinator
//!
//! A single-writer actor mediates every mutation of the registry: commands
//! arrive on one channel, at most one worker operation runs at a time, and
//! each worker reports exactly one terminal event back to the actor.

pub mod coordinator;
mod deps;
pub mod env;
mod ops;
pub mod pipeline;
mod relay;
pub mod sync;
mod worker;

pub use coordinator::{Coordinator, CoordinatorConfig, RunSummary};
pub use deps::Deps;
pub use pipeline::{Context, Handler, HandlerRegistry, PipelineResult, Verdict};
pub use sync::{DownloadResult, SyncPolicy, UploadResult};
pub use worker::{WorkerError, WorkerExit, WorkerPayload};

#[cfg(test)]
pub(crate) mod test_helpers;
