// SPDX-License-Identifier: MIT

//! Pipeline execution against the registry store

use gov_core::ChangeOp;

use crate::deps::Deps;
use crate::pipeline::context::Context;
use crate::worker::WorkerError;

/// Result of the execution stage.
#[derive(Debug)]
pub(crate) struct ExecOutcome {
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
    pub version: Option<String>,
}

impl ExecOutcome {
    fn applied(version: Option<String>, message: &str) -> Self {
        Self { success: true, message: message.to_string(), error: None, version }
    }

    fn rejected(message: String) -> Self {
        Self { success: false, message, error: Some("execution".to_string()), version: None }
    }
}

/// Apply the context's changeset, or restore its version, whichever is set.
pub(crate) async fn run(deps: &Deps, ctx: &Context) -> Result<ExecOutcome, WorkerError> {
    if let Some(changeset) = &ctx.changeset {
        let mut tx = deps.registry.changes().await?;
        for op in changeset {
            match op {
                ChangeOp::Create { entry } => tx.create(entry.clone()),
                ChangeOp::Update { entry } => tx.update(entry.clone()),
                ChangeOp::Delete { entry } => tx.delete(entry.id.clone()),
            }
        }
        return Ok(match tx.commit().await {
            Ok(outcome) => match outcome.version {
                Some(version) => {
                    ExecOutcome::applied(Some(version), "Changes applied successfully")
                }
                None => ExecOutcome::applied(None, "No changes needed to be applied"),
            },
            Err(e) => ExecOutcome::rejected(e.to_string()),
        });
    }

    if let Some(version_id) = &ctx.version_id {
        return Ok(match deps.registry.apply_version(version_id).await {
            Ok(outcome) => match outcome.version {
                Some(version) => {
                    ExecOutcome::applied(Some(version), "Version applied successfully")
                }
                None => ExecOutcome::applied(None, "No changes needed to be applied"),
            },
            Err(e) => ExecOutcome::rejected(e.to_string()),
        });
    }

    // The pre-processor guarantees one of the two branches above.
    Ok(ExecOutcome::rejected("nothing to execute".to_string()))
}

#[cfg(test)]
#[path = "execute_tests.rs"]
mod tests;
