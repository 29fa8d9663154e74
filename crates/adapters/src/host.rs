// SPDX-License-Identifier: MIT

//! Process host seam
//!
//! Workers run as independent units of execution. The host abstracts where
//! they run so the coordinator can roll back cleanly when a spawn fails.

use futures_util::future::BoxFuture;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("failed to spawn worker on {host}: {reason}")]
    Failed { host: String, reason: String },
}

pub trait ProcessHost: Send + Sync {
    /// Host name, e.g. `app:processes`. Diagnostic only.
    fn name(&self) -> &str;

    fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), SpawnError>;
}

/// Spawns workers as tokio tasks.
#[derive(Clone)]
pub struct TokioHost {
    name: String,
}

impl TokioHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ProcessHost for TokioHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), SpawnError> {
        tokio::spawn(task);
        Ok(())
    }
}

/// Host whose spawns always fail. Exercises the coordinator's rollback path.
#[derive(Clone, Default)]
pub struct FailingHost;

impl ProcessHost for FailingHost {
    fn name(&self) -> &str {
        "test:failing"
    }

    fn spawn(&self, _task: BoxFuture<'static, ()>) -> Result<(), SpawnError> {
        Err(SpawnError::Failed {
            host: self.name().to_string(),
            reason: "host refused the task".to_string(),
        })
    }
}
