// SPDX-License-Identifier: MIT

//! Worker exit handling
//!
//! Exactly one terminal event arrives per spawned worker. The handler
//! resolves the pending operation: plain operations reply directly, a
//! finished uploader chains into the change stage, and the version-change
//! event is always published before the client reply goes out.

use serde_json::Value;

use gov_core::{Clock, VersionChanged, WorkerId};
use gov_wire::ReplyEnvelope;

use crate::coordinator::{send_reply, Coordinator, PendingOperation, Stage};
use crate::pipeline::{self, PipelineInput, PipelineResult};
use crate::relay;
use crate::sync::{DownloadResult, UploadResult};
use crate::worker::{self, WorkerExit, WorkerPayload};

impl<C: Clock> Coordinator<C> {
    pub(crate) async fn handle_worker_exit(&mut self, exit: WorkerExit) {
        let now = self.clock.epoch_secs();
        let Some(pending) = self.state.pending_operations.remove(&exit.worker_id) else {
            tracing::warn!(worker_id = %exit.worker_id, "exit event for unknown worker, ignoring");
            return;
        };

        match (exit.payload, exit.error) {
            (Some(payload), _) => self.dispatch_payload(pending, payload, now).await,
            (None, Some(reason)) => {
                tracing::error!(
                    worker_id = %exit.worker_id,
                    operation = %pending.operation,
                    error = %reason,
                    "worker failed"
                );
                let failure =
                    ReplyEnvelope::failure(&pending.request_id, now, reason, "Operation failed");
                self.finish(pending, failure).await;
            }
            (None, None) => {
                tracing::error!(
                    worker_id = %exit.worker_id,
                    operation = %pending.operation,
                    "worker exited with neither value nor error"
                );
                let failure = ReplyEnvelope::failure(
                    &pending.request_id,
                    now,
                    "worker_no_result",
                    "Worker exited without reporting a result",
                );
                self.finish(pending, failure).await;
            }
        }
    }

    async fn dispatch_payload(
        &mut self,
        pending: PendingOperation,
        payload: WorkerPayload,
        now: u64,
    ) {
        match (pending.stage, payload) {
            (Stage::Upload, WorkerPayload::Upload(result)) => {
                self.handle_upload_result(pending, result, now).await;
            }
            (Stage::Change, WorkerPayload::Change(result)) => {
                self.finish_upload_chain(pending, result, now).await;
            }
            (Stage::Single, WorkerPayload::Change(result)) => {
                self.finish_apply(pending, result, now).await;
            }
            (Stage::Single, WorkerPayload::Download(result)) => {
                self.finish_download(pending, result, now).await;
            }
            (stage, _) => {
                tracing::error!(?stage, operation = %pending.operation, "unexpected worker result");
                let failure = ReplyEnvelope::failure(
                    &pending.request_id,
                    now,
                    "worker",
                    "Worker returned an unexpected result",
                );
                self.finish(pending, failure).await;
            }
        }
    }

    /// Uploader finished. Reply directly for failures, check-only runs and
    /// empty deltas; otherwise chain the change stage on the produced
    /// changeset. The client sees one logical response for the pair.
    async fn handle_upload_result(
        &mut self,
        mut pending: PendingOperation,
        result: UploadResult,
        now: u64,
    ) {
        if !result.success {
            let failure =
                ReplyEnvelope::failure(&pending.request_id, now, "upload", result.message.clone());
            self.finish(pending, failure).await;
            return;
        }

        if pending.options.check_only() {
            self.state.filesystem_changes_pending = result.has_changes;
            let mut ok = ReplyEnvelope::success(&pending.request_id, now);
            ok.message = Some(result.message.clone());
            ok.count = Some(result.count);
            ok.has_changes = Some(result.has_changes);
            ok.changeset = Some(result.formatted_changeset.clone());
            ok.stats = serde_json::to_value(result.stats).ok();
            self.finish(pending, ok).await;
            return;
        }

        if !result.has_changes {
            let mut ok = ReplyEnvelope::success(&pending.request_id, now);
            ok.message = Some("No changes to apply".to_string());
            ok.count = Some(0);
            ok.has_changes = Some(false);
            ok.stats = serde_json::to_value(result.stats).ok();
            self.finish(pending, ok).await;
            return;
        }

        let raw_changeset = match serde_json::to_value(&result.changeset) {
            Ok(Value::Array(items)) => items,
            _ => {
                let failure = ReplyEnvelope::failure(
                    &pending.request_id,
                    now,
                    "upload",
                    "Upload produced an unusable changeset",
                );
                self.finish(pending, failure).await;
                return;
            }
        };

        let deps = self.deps.clone();
        let input = PipelineInput {
            raw_changeset: Some(raw_changeset),
            version_id: None,
            options: pending.options.clone(),
            user_id: pending.user_id.clone(),
            request_id: pending.request_id.clone(),
        };
        let worker_id = WorkerId::new();
        let body = async move { pipeline::run(&deps, input).await.map(WorkerPayload::Change) };
        let task = worker::monitored(worker_id.clone(), self.exit_tx.clone(), body);

        match self.deps.host.spawn(task) {
            Ok(()) => {
                tracing::info!(count = result.count, "upload delta ready, chaining change stage");
                pending.stage = Stage::Change;
                pending.upload_result = Some(result);
                self.state.pending_operations.insert(worker_id, pending);
                // Busy stays held for the whole chain; no reply yet.
            }
            Err(e) => {
                tracing::error!(error = %e, "change stage spawn failed");
                let failure = ReplyEnvelope::failure(
                    &pending.request_id,
                    now,
                    "spawn",
                    format!("Failed to start worker: {e}"),
                );
                self.finish(pending, failure).await;
            }
        }
    }

    /// Change stage of an upload finished: fold in the carried upload stats
    /// and resolve the chain.
    async fn finish_upload_chain(
        &mut self,
        pending: PendingOperation,
        result: PipelineResult,
        now: u64,
    ) {
        let mut reply = reply_from_pipeline(&pending, &result, now);
        if let Some(upload) = &pending.upload_result {
            reply.stats = serde_json::to_value(upload.stats).ok();
            reply.count = Some(upload.count);
        }
        if result.success {
            self.state.filesystem_changes_pending = false;
            self.state.registry_changes_pending = true;
            self.state.last_operation_type = Some("upload".to_string());
            self.publish_if_version_changed(result.version.as_deref(), now).await;
        }
        self.finish(pending, reply).await;
    }

    async fn finish_apply(
        &mut self,
        pending: PendingOperation,
        result: PipelineResult,
        now: u64,
    ) {
        let reply = reply_from_pipeline(&pending, &result, now);
        if result.success {
            self.state.registry_changes_pending = true;
            self.state.last_operation_type = Some(pending.operation.as_str().to_string());
            self.publish_if_version_changed(result.version.as_deref(), now).await;
        }
        self.finish(pending, reply).await;
    }

    async fn finish_download(
        &mut self,
        pending: PendingOperation,
        result: DownloadResult,
        now: u64,
    ) {
        let mut reply = ReplyEnvelope {
            request_id: pending.request_id.clone(),
            success: result.success,
            timestamp: now,
            message: Some(result.message.clone()),
            ..ReplyEnvelope::default()
        };
        if !result.success {
            reply.error = Some("download".to_string());
        }
        reply.version = result.version.clone();
        reply.stats = serde_json::to_value(result.stats).ok();
        if pending.options.check_orphans() {
            reply.extra.insert(
                "orphaned_files".to_string(),
                Value::from(result.orphans.clone()),
            );
        }

        if result.success && !pending.options.check_orphans() {
            self.state.registry_changes_pending = false;
            self.state.last_operation_type = Some("download".to_string());
            self.state.last_download_version = result.version.clone();
        }
        self.finish(pending, reply).await;
    }

    /// Publish `registry:version` if the version moved, then update the
    /// cached version. Runs before the client reply goes out.
    async fn publish_if_version_changed(&mut self, new_version: Option<&str>, now: u64) {
        let Some(new_version) = new_version else { return };
        if self.state.current_version.as_deref() == Some(new_version) {
            return;
        }
        let event = VersionChanged {
            old_version: self.state.current_version.clone(),
            new_version: new_version.to_string(),
            timestamp: now,
        };
        relay::publish_version_change(&*self.deps.bus, &self.config.event_topic, event).await;
        self.state.current_version = Some(new_version.to_string());
        self.state.last_updated = now;
    }

    async fn finish(&mut self, pending: PendingOperation, reply: ReplyEnvelope) {
        send_reply(&pending.reply, reply).await;
        self.state.clear_busy();
    }
}

fn reply_from_pipeline(
    pending: &PendingOperation,
    result: &PipelineResult,
    now: u64,
) -> ReplyEnvelope {
    let mut reply = ReplyEnvelope {
        request_id: pending.request_id.clone(),
        success: result.success,
        timestamp: now,
        message: Some(result.message.clone()),
        error: result.error.clone(),
        version: result.version.clone(),
        details: result.details.clone(),
        ..ReplyEnvelope::default()
    };
    reply.extra = result.extra.clone();
    if let Some(changeset) = &result.changeset {
        if let Ok(Value::Array(items)) = serde_json::to_value(changeset) {
            reply.changeset = Some(items);
        }
    }
    reply
}

#[cfg(test)]
#[path = "exit_tests.rs"]
mod tests;
