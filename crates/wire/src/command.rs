// SPDX-License-Identifier: MIT

//! Command envelope and the in-process command channel

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use gov_core::Options;

use crate::reply::ReplyEnvelope;

/// Operations the coordinator accepts.
///
/// The envelope carries the operation as a plain string so an unknown name
/// reaches the coordinator and gets a proper `unknown_operation` reply
/// instead of failing to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ApplyChanges,
    ApplyVersion,
    Upload,
    Download,
    GetState,
}

impl Operation {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "apply_changes" => Some(Operation::ApplyChanges),
            "apply_version" => Some(Operation::ApplyVersion),
            "upload" => Some(Operation::Upload),
            "download" => Some(Operation::Download),
            "get_state" => Some(Operation::GetState),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ApplyChanges => "apply_changes",
            Operation::ApplyVersion => "apply_version",
            Operation::Upload => "upload",
            Operation::Download => "download",
            Operation::GetState => "get_state",
        }
    }

    /// Mutating operations hold the single-writer flag; `get_state` is the
    /// only read path that bypasses it.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Operation::GetState)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message sent on the governance command topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandEnvelope {
    /// Request id; the reply's `request_id` must match.
    pub id: String,
    pub operation: String,
    /// Name of the caller's ephemeral reply channel.
    pub respond_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Unix seconds at send time.
    pub timestamp: u64,
    /// Raw operations; the pipeline's pre-processor owns shape validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

/// In-process command: the wire envelope plus the caller's reply channel.
#[derive(Debug)]
pub struct Command {
    pub envelope: CommandEnvelope,
    pub reply: mpsc::Sender<ReplyEnvelope>,
}

/// Handle for submitting commands to the coordinator.
pub type CommandSender = mpsc::Sender<Command>;

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
