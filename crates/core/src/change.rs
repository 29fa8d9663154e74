// SPDX-License-Identifier: MIT

//! Change operations and changesets

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::entry::{Entry, EntryId};

/// Ordered sequence of change operations, applied atomically by the registry.
pub type Changeset = Vec<ChangeOp>;

/// Discriminant of a change operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    #[serde(rename = "entry.create")]
    Create,
    #[serde(rename = "entry.update")]
    Update,
    #[serde(rename = "entry.delete")]
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "entry.create",
            ChangeKind::Update => "entry.update",
            ChangeKind::Delete => "entry.delete",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a delete operation. Only the id is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteTarget {
    pub id: EntryId,
}

/// A single change operation.
///
/// Serializes as `{"kind": "entry.create", "entry": {...}}` per the
/// command envelope format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum ChangeOp {
    #[serde(rename = "entry.create")]
    Create { entry: Entry },

    #[serde(rename = "entry.update")]
    Update { entry: Entry },

    #[serde(rename = "entry.delete")]
    Delete { entry: DeleteTarget },
}

/// Shape problems detected while parsing a raw change operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OpShapeError {
    #[error("operation is not an object")]
    NotAnObject,

    #[error("operation is missing 'kind'")]
    MissingKind,

    #[error("unrecognized operation kind: {0}")]
    UnknownKind(String),

    #[error("operation is missing 'entry'")]
    MissingEntry,

    #[error("delete operation is missing 'entry.id'")]
    MissingId,

    #[error("malformed entry: {0}")]
    BadEntry(String),
}

impl ChangeOp {
    /// Parse a raw operation as received from a client.
    ///
    /// Shape problems are reported per-item so a pre-processor can record a
    /// detail and keep going with the remaining operations.
    pub fn from_value(raw: &Value) -> Result<Self, OpShapeError> {
        let obj = raw.as_object().ok_or(OpShapeError::NotAnObject)?;
        let kind = obj
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(OpShapeError::MissingKind)?;
        let entry = obj.get("entry").ok_or(OpShapeError::MissingEntry)?;
        match kind {
            "entry.create" | "entry.update" => {
                let entry: Entry = serde_json::from_value(entry.clone())
                    .map_err(|e| OpShapeError::BadEntry(e.to_string()))?;
                if kind == "entry.create" {
                    Ok(ChangeOp::Create { entry })
                } else {
                    Ok(ChangeOp::Update { entry })
                }
            }
            "entry.delete" => {
                if entry.get("id").is_none() {
                    return Err(OpShapeError::MissingId);
                }
                let target: DeleteTarget = serde_json::from_value(entry.clone())
                    .map_err(|e| OpShapeError::BadEntry(e.to_string()))?;
                Ok(ChangeOp::Delete { entry: target })
            }
            other => Err(OpShapeError::UnknownKind(other.to_string())),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeOp::Create { .. } => ChangeKind::Create,
            ChangeOp::Update { .. } => ChangeKind::Update,
            ChangeOp::Delete { .. } => ChangeKind::Delete,
        }
    }

    pub fn id(&self) -> &EntryId {
        match self {
            ChangeOp::Create { entry } | ChangeOp::Update { entry } => &entry.id,
            ChangeOp::Delete { entry } => &entry.id,
        }
    }

    /// The full entry for create/update; deletes carry only an id.
    pub fn entry(&self) -> Option<&Entry> {
        match self {
            ChangeOp::Create { entry } | ChangeOp::Update { entry } => Some(entry),
            ChangeOp::Delete { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
