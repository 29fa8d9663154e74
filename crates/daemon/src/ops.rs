// SPDX-License-Identifier: MIT

//! The `get_state` read path

use gov_wire::{ChangesState, GovernanceState, RegistryState, StateReport};

use crate::coordinator::CoordinatorState;
use crate::deps::Deps;

/// Assemble the state report. Always succeeds; a store failure falls back
/// to the coordinator's cached version.
pub(crate) async fn state_report(deps: &Deps, state: &CoordinatorState, now: u64) -> StateReport {
    let current_version = match deps.registry.current_version().await {
        Ok(version) => version,
        Err(e) => {
            tracing::warn!(error = %e, "registry version read failed, using cached value");
            state.current_version.clone()
        }
    };

    StateReport {
        registry: RegistryState { current_version, timestamp: now },
        governance: GovernanceState {
            status: "running".to_string(),
            pid: std::process::id(),
            operation_in_progress: state.operation_in_progress,
            current_operation: state.current_operation.map(|op| op.as_str().to_string()),
            last_operation_type: state.last_operation_type.clone(),
            last_updated: state.last_updated,
        },
        changes: ChangesState {
            filesystem_changes_pending: state.filesystem_changes_pending,
            registry_changes_pending: state.registry_changes_pending,
        },
    }
}
