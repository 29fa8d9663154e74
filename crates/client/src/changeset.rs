// SPDX-License-Identifier: MIT

//! Changeset builder

use serde_json::{json, Value};

use gov_core::{Entry, EntryId};

/// Accumulates change operations for a `request_changes` call.
///
/// The client extracts the raw operation list through [`ChangesetBuilder::ops`].
#[derive(Debug, Clone, Default)]
pub struct ChangesetBuilder {
    ops: Vec<Value>,
}

impl ChangesetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, entry: &Entry) -> Self {
        self.ops.push(json!({"kind": "entry.create", "entry": entry}));
        self
    }

    pub fn update(mut self, entry: &Entry) -> Self {
        self.ops.push(json!({"kind": "entry.update", "entry": entry}));
        self
    }

    pub fn delete(mut self, id: &EntryId) -> Self {
        self.ops.push(json!({"kind": "entry.delete", "entry": {"id": id}}));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The raw operation list.
    pub fn ops(&self) -> &[Value] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Value> {
        self.ops
    }
}

#[cfg(test)]
#[path = "changeset_tests.rs"]
mod tests;
