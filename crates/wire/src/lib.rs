// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gov-wire: Command and reply envelopes for the governance protocol
//!
//! The command topic carries [`CommandEnvelope`]; replies land on the
//! caller's ephemeral channel as [`ReplyEnvelope`]. In process, the two are
//! tied together by [`Command`], which pairs the envelope with the reply
//! sender.

mod command;
mod detail;
mod reply;
mod state;
mod stats;

pub use command::{Command, CommandEnvelope, CommandSender, Operation};
pub use detail::Detail;
pub use reply::ReplyEnvelope;
pub use state::{ChangesState, GovernanceState, RegistryState, StateReport};
pub use stats::{DownloadStats, UploadStats};
