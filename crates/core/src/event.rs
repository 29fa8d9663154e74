// SPDX-License-Identifier: MIT

//! Version-change event payload

use serde::{Deserialize, Serialize};

/// Event name used on the relay topic.
pub const VERSION_EVENT: &str = "registry:version";

/// Published when the coordinator observes the registry version change.
///
/// Exactly one event is emitted per apply that changes the version, before
/// the client reply is sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionChanged {
    pub old_version: Option<String>,
    pub new_version: String,
    pub timestamp: u64,
}
