// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gov-store: Registry store interface and the in-memory backend

mod delta;
mod memory;
mod registry;

pub use delta::build_delta;
pub use memory::MemoryRegistry;
pub use registry::{ApplyOutcome, ChangeTx, Registry, Snapshot, StoreError, VersionInfo};
