// SPDX-License-Identifier: MIT

//! Client-side error kinds

use thiserror::Error;

use gov_adapters::PermissionError;
use gov_wire::{Detail, ReplyEnvelope};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// The reply's `request_id` did not match the request.
    #[error("response for a different request")]
    Correlation,

    #[error("timed out waiting for reply after {0} seconds")]
    Timeout(u64),

    /// The coordinator is gone or the reply channel closed early.
    #[error("governance coordinator unavailable")]
    Disconnected,

    /// The caller handed over a changeset that is not a list of objects.
    #[error("invalid changeset: {0}")]
    InvalidChangeset(String),

    /// The coordinator replied with `success: false`.
    #[error("{message}")]
    Rejected {
        message: String,
        /// Machine-readable kind, e.g. `busy`, `validation`, `spawn`.
        error: Option<String>,
        details: Vec<Detail>,
    },
}

impl ClientError {
    pub(crate) fn rejected(reply: ReplyEnvelope) -> Self {
        ClientError::Rejected {
            message: reply
                .message
                .or(reply.error.clone())
                .unwrap_or_else(|| "operation failed".to_string()),
            error: reply.error,
            details: reply.details,
        }
    }

    /// The coordinator refused because another operation holds the writer.
    pub fn is_busy(&self) -> bool {
        matches!(self, ClientError::Rejected { error: Some(kind), .. } if kind == "busy")
    }
}
