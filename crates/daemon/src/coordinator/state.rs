// SPDX-License-Identifier: MIT

//! Coordinator state
//!
//! Owned exclusively by the coordinator task. The single in-flight mutation
//! is enforced by `operation_in_progress`, not by a lock: nothing else may
//! read or write this state.

use std::collections::HashMap;

use tokio::sync::mpsc;

use gov_core::{Options, WorkerId};
use gov_wire::{Operation, ReplyEnvelope};

use crate::sync::UploadResult;

/// Where a pending worker sits in the upload→change chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    /// First half of an upload: building the delta.
    Upload,
    /// Second half of an upload: applying the delta through the pipeline.
    Change,
    /// A plain operation with no follow-on stage.
    Single,
}

/// Book-keeping for one spawned worker.
pub(crate) struct PendingOperation {
    pub reply: mpsc::Sender<ReplyEnvelope>,
    pub request_id: String,
    pub operation: Operation,
    pub stage: Stage,
    pub user_id: Option<String>,
    pub options: Options,
    pub start_time: u64,
    /// Uploader result carried into the change stage for final stats.
    pub upload_result: Option<UploadResult>,
}

/// Process-local governance state.
pub struct CoordinatorState {
    pub current_version: Option<String>,
    pub last_updated: u64,
    pub operation_in_progress: bool,
    pub current_operation: Option<Operation>,
    pub operation_start_time: Option<u64>,
    pub(crate) pending_operations: HashMap<WorkerId, PendingOperation>,
    pub registry_changes_pending: bool,
    pub filesystem_changes_pending: bool,
    pub last_download_version: Option<String>,
    pub last_operation_type: Option<String>,
    pub process_host: String,
}

impl CoordinatorState {
    pub fn new(current_version: Option<String>, process_host: String, now: u64) -> Self {
        Self {
            current_version,
            last_updated: now,
            operation_in_progress: false,
            current_operation: None,
            operation_start_time: None,
            pending_operations: HashMap::new(),
            registry_changes_pending: false,
            filesystem_changes_pending: false,
            last_download_version: None,
            last_operation_type: None,
            process_host,
        }
    }

    pub(crate) fn begin(&mut self, operation: Operation, now: u64) {
        self.operation_in_progress = true;
        self.current_operation = Some(operation);
        self.operation_start_time = Some(now);
    }

    pub(crate) fn clear_busy(&mut self) {
        self.operation_in_progress = false;
        self.current_operation = None;
        self.operation_start_time = None;
    }
}
