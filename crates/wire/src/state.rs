// SPDX-License-Identifier: MIT

//! DTOs for the `get_state` report

use serde::{Deserialize, Serialize};

/// Registry half of the state report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RegistryState {
    pub current_version: Option<String>,
    pub timestamp: u64,
}

/// Coordinator half of the state report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GovernanceState {
    pub status: String,
    pub pid: u32,
    pub operation_in_progress: bool,
    pub current_operation: Option<String>,
    pub last_operation_type: Option<String>,
    pub last_updated: u64,
}

/// Pending-change hints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ChangesState {
    pub filesystem_changes_pending: bool,
    pub registry_changes_pending: bool,
}

/// Full `get_state` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StateReport {
    pub registry: RegistryState,
    pub governance: GovernanceState,
    pub changes: ChangesState,
}
