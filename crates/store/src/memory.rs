// SPDX-License-Identifier: MIT

//! In-memory registry backend
//!
//! Keeps the full entry map per recorded version so `apply_version` can
//! restore any point in history. Version ids are monotonic (`v1`, `v2`, …)
//! which keeps tests deterministic.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use gov_core::{ChangeOp, Clock, Entry, EntryId, SystemClock};

use crate::registry::{ApplyOutcome, ChangeTx, Registry, Snapshot, StoreError, VersionInfo};

type EntryMap = BTreeMap<String, Entry>;

struct VersionRecord {
    info: VersionInfo,
    entries: EntryMap,
}

struct MemoryState {
    entries: EntryMap,
    versions: Vec<VersionRecord>,
    counter: u64,
}

impl MemoryState {
    /// Record `next` as a new version if it differs from the current entry
    /// set. Returns the new version id, or `None` for a no-op.
    fn commit_entries(&mut self, next: EntryMap, timestamp: u64) -> Option<String> {
        if next == self.entries {
            return None;
        }
        self.counter += 1;
        let id = format!("v{}", self.counter);
        self.entries = next.clone();
        self.versions.push(VersionRecord {
            info: VersionInfo { id: id.clone(), timestamp },
            entries: next,
        });
        Some(id)
    }
}

/// In-memory [`Registry`] implementation.
#[derive(Clone)]
pub struct MemoryRegistry<C: Clock = SystemClock> {
    state: Arc<Mutex<MemoryState>>,
    clock: C,
}

impl MemoryRegistry<SystemClock> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> MemoryRegistry<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                entries: EntryMap::new(),
                versions: Vec::new(),
                counter: 0,
            })),
            clock,
        }
    }

    /// Seed entries without recording history. Intended for test setup.
    pub fn seed(&self, entries: impl IntoIterator<Item = Entry>) {
        let mut state = self.state.lock();
        for entry in entries {
            state.entries.insert(entry.id.to_string(), entry);
        }
    }
}

struct MemoryTx<C: Clock> {
    state: Arc<Mutex<MemoryState>>,
    clock: C,
    ops: Vec<ChangeOp>,
}

#[async_trait]
impl<C: Clock> ChangeTx for MemoryTx<C> {
    fn create(&mut self, entry: Entry) {
        self.ops.push(ChangeOp::Create { entry });
    }

    fn update(&mut self, entry: Entry) {
        self.ops.push(ChangeOp::Update { entry });
    }

    fn delete(&mut self, id: EntryId) {
        self.ops.push(ChangeOp::Delete { entry: gov_core::change::DeleteTarget { id } });
    }

    async fn commit(self: Box<Self>) -> Result<ApplyOutcome, StoreError> {
        let mut state = self.state.lock();
        let mut next = state.entries.clone();
        for op in &self.ops {
            match op {
                ChangeOp::Create { entry } | ChangeOp::Update { entry } => {
                    next.insert(entry.id.to_string(), entry.clone());
                }
                ChangeOp::Delete { entry } => {
                    next.remove(&entry.id.to_string());
                }
            }
        }
        let version = state.commit_entries(next, self.clock.epoch_secs());
        Ok(ApplyOutcome { version })
    }
}

#[async_trait]
impl<C: Clock> Registry for MemoryRegistry<C> {
    async fn current_version(&self) -> Result<Option<String>, StoreError> {
        Ok(self.state.lock().versions.last().map(|r| r.info.id.clone()))
    }

    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let state = self.state.lock();
        Ok(Snapshot {
            version: state.versions.last().map(|r| r.info.id.clone()),
            entries: state.entries.values().cloned().collect(),
        })
    }

    async fn changes(&self) -> Result<Box<dyn ChangeTx>, StoreError> {
        Ok(Box::new(MemoryTx {
            state: Arc::clone(&self.state),
            clock: self.clock.clone(),
            ops: Vec::new(),
        }))
    }

    async fn history(&self) -> Result<Vec<VersionInfo>, StoreError> {
        Ok(self.state.lock().versions.iter().map(|r| r.info.clone()).collect())
    }

    async fn apply_version(&self, version: &str) -> Result<ApplyOutcome, StoreError> {
        let mut state = self.state.lock();
        let restored = state
            .versions
            .iter()
            .find(|r| r.info.id == version)
            .map(|r| r.entries.clone())
            .ok_or_else(|| StoreError::VersionNotFound(version.to_string()))?;
        let new_version = state.commit_entries(restored, self.clock.epoch_secs());
        Ok(ApplyOutcome { version: new_version })
    }

    async fn find(&self, meta_type: &str) -> Result<Vec<Entry>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .entries
            .values()
            .filter(|e| e.meta_type() == Some(meta_type))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
