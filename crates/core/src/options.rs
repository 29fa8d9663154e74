// SPDX-License-Identifier: MIT

//! Caller-supplied operation options
//!
//! Options travel the command envelope as an open string→value map. The
//! coordinator restores them to their original values after every processor
//! step, so extensions cannot overwrite them once a pipeline has begun.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entry::Entry;

/// Open map of caller-supplied options with typed accessors for the keys
/// the core interprets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(IndexMap<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    fn str_opt(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Sync source/target directory. Falls back to `APP_SRC` at the worker.
    pub fn directory(&self) -> Option<&str> {
        self.str_opt("directory")
    }

    /// Filesystem id. Falls back to `APP_FS` at the worker.
    pub fn filesystem(&self) -> Option<&str> {
        self.str_opt("filesystem")
    }

    /// Upload diffs without producing an applicable changeset.
    pub fn check_only(&self) -> bool {
        self.bool_or("check_only", false)
    }

    /// Orphan and empty-namespace cleanup during download. Enabled by default.
    pub fn cleanup_orphaned(&self) -> bool {
        self.bool_or("cleanup_orphaned", true)
    }

    /// Read-only orphan scan instead of a full download.
    pub fn check_orphans(&self) -> bool {
        self.bool_or("check_orphans", false)
    }

    /// Client-side reply deadline override, in seconds.
    pub fn timeout_secs(&self) -> Option<u64> {
        self.get("timeout_secs").and_then(Value::as_u64)
    }

    /// Entries just removed from the registry, whose side files the
    /// downloader should delete.
    pub fn deleted_entries(&self) -> Vec<Entry> {
        self.get("deleted_entries")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

impl FromIterator<(String, Value)> for Options {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
