// SPDX-License-Identifier: MIT

//! Reply envelope

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::detail::Detail;
use crate::state::StateReport;

/// Message delivered on the caller's reply channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReplyEnvelope {
    pub request_id: String,
    pub success: bool,
    /// Unix seconds at reply time.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable error kind, e.g. `busy`, `validation`, `spawn`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Upload/download statistics, shape depending on the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
    /// The executed changeset (possibly transformed by processors).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Detail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateReport>,
    /// Delta size for sync operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_changes: Option<bool>,
    /// Custom keys carried out of the processor chain.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReplyEnvelope {
    pub fn success(request_id: impl Into<String>, timestamp: u64) -> Self {
        Self {
            request_id: request_id.into(),
            success: true,
            timestamp,
            ..Self::default()
        }
    }

    pub fn failure(
        request_id: impl Into<String>,
        timestamp: u64,
        error: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            timestamp,
            message: Some(message.into()),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "reply_tests.rs"]
mod tests;
