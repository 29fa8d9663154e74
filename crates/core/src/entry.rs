// SPDX-License-Identifier: MIT

//! Registry entry domain types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from parsing an entry id.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntryIdError {
    #[error("entry id missing ':' separator: {0:?}")]
    MissingSeparator(String),

    #[error("entry id has an empty namespace: {0:?}")]
    EmptyNamespace(String),

    #[error("entry id has an empty name: {0:?}")]
    EmptyName(String),

    #[error("entry id contains a path separator: {0:?}")]
    PathSeparator(String),

    #[error("namespace has an empty component: {0:?}")]
    EmptyComponent(String),
}

/// Identifier of a registry entry: `<namespace>:<name>`.
///
/// The namespace is a dotted identifier (`a.b.c`) that maps to a directory
/// path on disk, so `/` is rejected in both halves and namespace components
/// must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    namespace: String,
    name: String,
}

impl EntryId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, EntryIdError> {
        let id = Self { namespace: namespace.into(), name: name.into() };
        id.validate()?;
        Ok(id)
    }

    /// Parse a `<namespace>:<name>` string.
    pub fn parse(raw: &str) -> Result<Self, EntryIdError> {
        let (namespace, name) = raw
            .split_once(':')
            .ok_or_else(|| EntryIdError::MissingSeparator(raw.to_string()))?;
        Self::new(namespace, name)
    }

    fn validate(&self) -> Result<(), EntryIdError> {
        let raw = self.to_string();
        if self.namespace.is_empty() {
            return Err(EntryIdError::EmptyNamespace(raw));
        }
        if self.name.is_empty() {
            return Err(EntryIdError::EmptyName(raw));
        }
        if self.namespace.contains('/') || self.name.contains('/') {
            return Err(EntryIdError::PathSeparator(raw));
        }
        if self.namespace.split('.').any(str::is_empty) {
            return Err(EntryIdError::EmptyComponent(raw));
        }
        Ok(())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

impl Serialize for EntryId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        EntryId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A single registry record, typed by `kind` and optionally refined by
/// `meta.type`. The `data` schema is per-kind; the core only inspects the
/// fields the sync policy names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl Entry {
    pub fn new(id: EntryId, kind: impl Into<String>) -> Self {
        Self { id, kind: kind.into(), meta: Map::new(), data: Map::new() }
    }

    /// The finer discriminant used to select per-entry behaviors.
    pub fn meta_type(&self) -> Option<&str> {
        self.meta.get("type").and_then(Value::as_str)
    }

    /// Extension ordering weight. Defaults to 0 when absent or non-numeric.
    pub fn priority(&self) -> i64 {
        self.meta.get("priority").and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn data_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    pub fn set_data(&mut self, field: &str, value: Value) {
        self.data.insert(field.to_string(), value);
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
