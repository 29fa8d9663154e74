// SPDX-License-Identifier: MIT

//! Registry store interface
//!
//! The entry store is an external collaborator. The governance service only
//! consumes this interface: snapshots, writable change transactions, version
//! history, version rollback, and meta-type queries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gov_core::{Changeset, Entry, EntryId};

/// Errors surfaced by a registry backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// An immutable consistent view of the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Version the snapshot was taken at. `None` before the first apply.
    pub version: Option<String>,
    pub entries: Vec<Entry>,
}

/// Recorded version metadata, newest last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub id: String,
    pub timestamp: u64,
}

/// Outcome of committing a change transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// New version id, or `None` when the store had no changes to apply.
    pub version: Option<String>,
}

/// Writable handle obtained from [`Registry::changes`]. Operations are
/// buffered and applied atomically on commit.
#[async_trait]
pub trait ChangeTx: Send {
    fn create(&mut self, entry: Entry);
    fn update(&mut self, entry: Entry);
    fn delete(&mut self, id: EntryId);
    async fn commit(self: Box<Self>) -> Result<ApplyOutcome, StoreError>;
}

/// The versioned entry store the governance service mediates.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Last applied version, `None` for an empty history.
    async fn current_version(&self) -> Result<Option<String>, StoreError>;

    async fn snapshot(&self) -> Result<Snapshot, StoreError>;

    /// Open a writable change transaction against the current snapshot.
    async fn changes(&self) -> Result<Box<dyn ChangeTx>, StoreError>;

    /// Version history, oldest first.
    async fn history(&self) -> Result<Vec<VersionInfo>, StoreError>;

    /// Restore the entry set recorded at `version`. Applying a version is a
    /// mutation: a new version is recorded unless the content is identical.
    async fn apply_version(&self, version: &str) -> Result<ApplyOutcome, StoreError>;

    /// Entries whose `meta.type` equals `meta_type`.
    async fn find(&self, meta_type: &str) -> Result<Vec<Entry>, StoreError>;

    /// Minimal changeset transforming `current` into `target`.
    fn build_delta(&self, current: &[Entry], target: &[Entry]) -> Changeset {
        crate::delta::build_delta(current, target)
    }
}
