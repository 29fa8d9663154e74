// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gov-adapters: Seams to the external collaborators
//!
//! The governance service treats the filesystem driver, the message bus,
//! the permission checker, and the process host as external. Each seam is
//! an async trait with a local implementation and an in-memory fake for
//! tests.

mod bus;
mod fs;
mod host;
mod permission;

pub use bus::{Bus, BusError, MemoryBus, Published};
pub use fs::{DirEntry, FsError, Filesystem, LocalFilesystem, MemoryFilesystem};
pub use host::{FailingHost, ProcessHost, SpawnError, TokioHost};
pub use permission::{AllowAll, PermissionChecker, PermissionError, StaticPolicy};
