// SPDX-License-Identifier: MIT

//! Delta construction between two entry sets

use std::collections::BTreeMap;

use gov_core::change::DeleteTarget;
use gov_core::{ChangeOp, Changeset, Entry};

/// Build the minimal changeset transforming `current` into `target`.
///
/// Creates come first, then updates, then deletes, each sorted by entry id
/// so the output is deterministic regardless of input order.
pub fn build_delta(current: &[Entry], target: &[Entry]) -> Changeset {
    let current: BTreeMap<_, _> = current.iter().map(|e| (e.id.clone(), e)).collect();
    let target: BTreeMap<_, _> = target.iter().map(|e| (e.id.clone(), e)).collect();

    let mut creates = Vec::new();
    let mut updates = Vec::new();
    for (id, entry) in &target {
        match current.get(id) {
            None => creates.push(ChangeOp::Create { entry: (*entry).clone() }),
            Some(existing) if existing != entry => {
                updates.push(ChangeOp::Update { entry: (*entry).clone() });
            }
            Some(_) => {}
        }
    }

    let mut ops: Changeset = creates;
    ops.extend(updates);
    for id in current.keys() {
        if !target.contains_key(id) {
            ops.push(ChangeOp::Delete { entry: DeleteTarget { id: id.clone() } });
        }
    }
    ops
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;
