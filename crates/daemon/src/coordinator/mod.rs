// SPDX-License-Identifier: MIT

//! The single-writer governance coordinator
//!
//! A cooperative actor owning all mutable governance state. It processes
//! one message at a time from two sources: the command channel and worker
//! terminal events. Mutual exclusion is the `operation_in_progress` flag —
//! no lock, because only this task touches the state.

mod exit;
mod state;

pub use state::CoordinatorState;
pub(crate) use state::{PendingOperation, Stage};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use gov_core::{Clock, WorkerId};
use gov_store::StoreError;
use gov_wire::{Command, CommandEnvelope, CommandSender, Operation, ReplyEnvelope};

use crate::deps::Deps;
use crate::ops;
use crate::pipeline::{self, PipelineInput};
use crate::sync;
use crate::worker::{self, WorkerError, WorkerExit, WorkerPayload};

/// Coordinator tuning.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Bus topic for version-change events.
    pub event_topic: String,
    pub command_buffer: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { event_topic: "wippy.central".to_string(), command_buffer: 32 }
    }
}

/// What `run` reports when the coordinator exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub status: String,
    pub last_version: Option<String>,
}

/// The governance actor. Create with [`Coordinator::new`], drive with
/// [`Coordinator::run`], submit commands through the returned sender.
pub struct Coordinator<C: Clock> {
    deps: Deps,
    clock: C,
    config: CoordinatorConfig,
    state: CoordinatorState,
    cmd_rx: mpsc::Receiver<Command>,
    exit_tx: mpsc::Sender<WorkerExit>,
    exit_rx: mpsc::Receiver<WorkerExit>,
    cancel: CancellationToken,
}

impl<C: Clock> Coordinator<C> {
    /// Read the current version from the registry and set up the channels.
    pub async fn new(
        deps: Deps,
        clock: C,
        config: CoordinatorConfig,
        cancel: CancellationToken,
    ) -> Result<(Self, CommandSender), StoreError> {
        let current_version = deps.registry.current_version().await?;
        let now = clock.epoch_secs();
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
        let (exit_tx, exit_rx) = mpsc::channel(8);
        let state =
            CoordinatorState::new(current_version, deps.host.name().to_string(), now);
        let coordinator =
            Self { deps, clock, config, state, cmd_rx, exit_tx, exit_rx, cancel };
        Ok((coordinator, cmd_tx))
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    /// Process messages until cancellation or until every command sender is
    /// dropped. In-flight workers are left to finish naturally.
    pub async fn run(mut self) -> RunSummary {
        tracing::info!(
            host = %self.state.process_host,
            current_version = ?self.state.current_version,
            "governance coordinator started"
        );
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(
                        last_version = ?self.state.current_version,
                        "coordinator cancelled, shutting down"
                    );
                    break;
                }
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                Some(exit) = self.exit_rx.recv() => self.handle_worker_exit(exit).await,
            }
        }
        RunSummary {
            status: "completed".to_string(),
            last_version: self.state.current_version.clone(),
        }
    }

    async fn handle_command(&mut self, cmd: Command) {
        let now = self.clock.epoch_secs();
        let Command { envelope, reply } = cmd;

        let Some(operation) = Operation::parse(&envelope.operation) else {
            tracing::warn!(operation = %envelope.operation, "unknown operation");
            let failure = ReplyEnvelope::failure(
                &envelope.id,
                now,
                "unknown_operation",
                format!("Unknown operation: {}", envelope.operation),
            );
            send_reply(&reply, failure).await;
            return;
        };

        if operation == Operation::GetState {
            tracing::debug!(request_id = %envelope.id, "state requested");
            let mut ok = ReplyEnvelope::success(&envelope.id, now);
            ok.state = Some(ops::state_report(&self.deps, &self.state, now).await);
            send_reply(&reply, ok).await;
            return;
        }

        tracing::info!(
            operation = %operation,
            request_id = %envelope.id,
            user_id = ?envelope.user_id,
            "command received"
        );

        if self.state.operation_in_progress {
            let current = self
                .state
                .current_operation
                .map(|op| op.as_str())
                .unwrap_or("unknown");
            let failure = ReplyEnvelope::failure(
                &envelope.id,
                now,
                "busy",
                format!("Operation already in progress: {current}"),
            );
            send_reply(&reply, failure).await;
            return;
        }

        let worker_id = WorkerId::new();
        let stage =
            if operation == Operation::Upload { Stage::Upload } else { Stage::Single };
        let body = self.worker_body(operation, &envelope);
        let task = worker::monitored(worker_id.clone(), self.exit_tx.clone(), body);

        match self.deps.host.spawn(task) {
            Ok(()) => {
                self.state.pending_operations.insert(
                    worker_id,
                    PendingOperation {
                        reply,
                        request_id: envelope.id.clone(),
                        operation,
                        stage,
                        user_id: envelope.user_id.clone(),
                        options: envelope.options.clone(),
                        start_time: now,
                        upload_result: None,
                    },
                );
                self.state.begin(operation, now);
            }
            Err(e) => {
                tracing::error!(error = %e, operation = %operation, "worker spawn failed");
                let failure = ReplyEnvelope::failure(
                    &envelope.id,
                    now,
                    "spawn",
                    format!("Failed to start worker: {e}"),
                );
                send_reply(&reply, failure).await;
            }
        }
    }

    fn worker_body(
        &self,
        operation: Operation,
        envelope: &CommandEnvelope,
    ) -> BoxFuture<'static, Result<WorkerPayload, WorkerError>> {
        let deps = self.deps.clone();
        let options = envelope.options.clone();
        let input = PipelineInput {
            raw_changeset: envelope.changeset.clone(),
            version_id: envelope.version_id.clone(),
            options: envelope.options.clone(),
            user_id: envelope.user_id.clone(),
            request_id: envelope.id.clone(),
        };
        async move {
            match operation {
                Operation::Upload => sync::run_upload(deps, options).await,
                Operation::Download => sync::run_download(deps, options).await,
                Operation::ApplyChanges | Operation::ApplyVersion => {
                    pipeline::run(&deps, input).await.map(WorkerPayload::Change)
                }
                // Handled synchronously in handle_command.
                Operation::GetState => unreachable!(),
            }
        }
        .boxed()
    }
}

pub(crate) async fn send_reply(reply: &mpsc::Sender<ReplyEnvelope>, envelope: ReplyEnvelope) {
    if reply.send(envelope).await.is_err() {
        tracing::debug!("reply channel dropped, client gave up waiting");
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
