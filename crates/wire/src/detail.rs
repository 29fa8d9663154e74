// SPDX-License-Identifier: MIT

//! Per-item diagnostics

use serde::{Deserialize, Serialize};

/// One per-item diagnostic attached to a pipeline result.
///
/// Details accumulate across the pipeline and are never discarded: a failed
/// run still returns every detail recorded up to the point of failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Detail {
    /// Subject of the diagnostic, e.g. `a.b:x` or `version:v3`.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl Detail {
    pub fn validation(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self { id: id.into(), kind: "validation".to_string(), message: message.into() }
    }

    pub fn warning(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self { id: id.into(), kind: "warning".to_string(), message: message.into() }
    }

    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self { id: id.into(), kind: "error".to_string(), message: message.into() }
    }
}
