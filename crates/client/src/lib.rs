// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gov-client: Typed façade over the governance command protocol
//!
//! Every call checks the corresponding permission, assigns a fresh request
//! id, opens an ephemeral reply channel, and waits with a deadline for the
//! correlated reply.

mod changeset;
mod client;
mod error;

pub use changeset::ChangesetBuilder;
pub use client::{Client, IntoOps, OperationOutcome};
pub use error::ClientError;
