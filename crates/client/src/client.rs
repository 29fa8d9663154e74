// SPDX-License-Identifier: MIT

//! The governance client

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use gov_adapters::PermissionChecker;
use gov_core::{Clock, Options, SystemClock};
use gov_wire::{
    Command, CommandEnvelope, CommandSender, Detail, Operation, ReplyEnvelope, StateReport,
};

use crate::changeset::ChangesetBuilder;
use crate::error::ClientError;

/// Default reply deadline.
const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Successful reply, minus the correlation plumbing.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub version: Option<String>,
    pub message: Option<String>,
    pub stats: Option<Value>,
    pub changeset: Option<Vec<Value>>,
    pub details: Vec<Detail>,
    pub count: Option<usize>,
    pub has_changes: Option<bool>,
    pub extra: serde_json::Map<String, Value>,
}

impl From<ReplyEnvelope> for OperationOutcome {
    fn from(reply: ReplyEnvelope) -> Self {
        Self {
            version: reply.version,
            message: reply.message,
            stats: reply.stats,
            changeset: reply.changeset,
            details: reply.details,
            count: reply.count,
            has_changes: reply.has_changes,
            extra: reply.extra,
        }
    }
}

/// Changeset argument: either an opaque builder exposing `ops()`, or a raw
/// operation list whose shape the client checks before forwarding.
pub trait IntoOps {
    fn into_ops(self) -> Result<Vec<Value>, ClientError>;
}

impl IntoOps for ChangesetBuilder {
    fn into_ops(self) -> Result<Vec<Value>, ClientError> {
        Ok(self.into_ops())
    }
}

impl IntoOps for Vec<Value> {
    fn into_ops(self) -> Result<Vec<Value>, ClientError> {
        for (index, op) in self.iter().enumerate() {
            if !op.is_object() {
                return Err(ClientError::InvalidChangeset(format!(
                    "item {index} is not an object"
                )));
            }
        }
        Ok(self)
    }
}

/// Typed client over the governance command channel.
#[derive(Clone)]
pub struct Client<C: Clock = SystemClock> {
    commands: CommandSender,
    permissions: Arc<dyn PermissionChecker>,
    clock: C,
    user_id: Option<String>,
    timeout: Duration,
}

impl Client<SystemClock> {
    pub fn new(commands: CommandSender, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self::with_clock(commands, permissions, SystemClock)
    }
}

impl<C: Clock> Client<C> {
    pub fn with_clock(
        commands: CommandSender,
        permissions: Arc<dyn PermissionChecker>,
        clock: C,
    ) -> Self {
        Self {
            commands,
            permissions,
            clock,
            user_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Coordinator and registry status. Never blocked by a running
    /// operation.
    pub async fn get_state(&self) -> Result<StateReport, ClientError> {
        let reply = self
            .call(Operation::GetState, "registry.request.read", None, None, Options::new())
            .await?;
        reply.state.ok_or(ClientError::Disconnected)
    }

    /// Submit a changeset through the change pipeline.
    pub async fn request_changes(
        &self,
        changeset: impl IntoOps,
        options: Options,
    ) -> Result<OperationOutcome, ClientError> {
        let ops = changeset.into_ops()?;
        let reply = self
            .call(
                Operation::ApplyChanges,
                "registry.request.write",
                Some(ops),
                None,
                options,
            )
            .await?;
        Ok(reply.into())
    }

    /// Restore a recorded registry version.
    pub async fn request_version(
        &self,
        version_id: impl Into<String>,
        options: Options,
    ) -> Result<OperationOutcome, ClientError> {
        let reply = self
            .call(
                Operation::ApplyVersion,
                "registry.request.version",
                None,
                Some(version_id.into()),
                options,
            )
            .await?;
        Ok(reply.into())
    }

    /// Materialize the registry to the sync directory.
    pub async fn request_download(&self, options: Options) -> Result<OperationOutcome, ClientError> {
        let reply = self
            .call(Operation::Download, "registry.request.sync", None, None, options)
            .await?;
        Ok(reply.into())
    }

    /// Diff the sync directory against the registry and apply the delta.
    pub async fn request_upload(&self, options: Options) -> Result<OperationOutcome, ClientError> {
        let reply = self
            .call(Operation::Upload, "registry.request.sync", None, None, options)
            .await?;
        Ok(reply.into())
    }

    async fn call(
        &self,
        operation: Operation,
        permission: &str,
        changeset: Option<Vec<Value>>,
        version_id: Option<String>,
        options: Options,
    ) -> Result<ReplyEnvelope, ClientError> {
        self.permissions.check(self.user_id.as_deref(), permission)?;

        let request_id = uuid::Uuid::new_v4().to_string();
        let respond_to = format!("reply-{}", nanoid::nanoid!(12));
        let timeout = options
            .timeout_secs()
            .map(Duration::from_secs)
            .unwrap_or(self.timeout);

        let (reply_tx, mut reply_rx) = mpsc::channel(1);
        let envelope = CommandEnvelope {
            id: request_id.clone(),
            operation: operation.as_str().to_string(),
            respond_to,
            user_id: self.user_id.clone(),
            timestamp: self.clock.epoch_secs(),
            changeset,
            version_id,
            options,
        };

        tracing::debug!(operation = %operation, request_id = %request_id, "sending command");
        self.commands
            .send(Command { envelope, reply: reply_tx })
            .await
            .map_err(|_| ClientError::Disconnected)?;

        let reply = tokio::time::timeout(timeout, reply_rx.recv())
            .await
            .map_err(|_| ClientError::Timeout(timeout.as_secs()))?
            .ok_or(ClientError::Disconnected)?;

        if reply.request_id != request_id {
            tracing::warn!(
                expected = %request_id,
                got = %reply.request_id,
                "discarding mismatched reply"
            );
            return Err(ClientError::Correlation);
        }
        if !reply.success {
            return Err(ClientError::rejected(reply));
        }
        Ok(reply)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
