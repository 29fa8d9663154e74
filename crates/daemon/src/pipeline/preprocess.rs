// SPDX-License-Identifier: MIT

//! Pipeline pre-processing: shape validation and the processor chain

use serde_json::Value;

use gov_core::ChangeOp;
use gov_wire::Detail;

use crate::deps::Deps;
use crate::pipeline::context::Context;
use crate::pipeline::extensions::{self, PROCESSOR_TYPE};
use crate::pipeline::Gate;
use crate::worker::WorkerError;

/// Validate the shape of the proposed change.
///
/// For a changeset: reject only when it is empty or every item is
/// ill-formed. Partially bad input records a detail per bad item and
/// proceeds with the remainder. For a version apply: confirm the version
/// exists in history.
pub(crate) async fn validate(
    deps: &Deps,
    ctx: &mut Context,
    raw_changeset: Option<&[Value]>,
    details: &mut Vec<Detail>,
) -> Result<Gate, WorkerError> {
    if let Some(raw) = raw_changeset {
        if raw.is_empty() {
            details.push(Detail::validation("changeset", "Changeset is empty"));
            return Ok(Gate::Reject {
                error: "validation",
                message: "Failed to validate changeset".to_string(),
            });
        }
        let mut parsed = Vec::with_capacity(raw.len());
        for (index, item) in raw.iter().enumerate() {
            match ChangeOp::from_value(item) {
                Ok(op) => parsed.push(op),
                Err(e) => details.push(Detail::validation(item_id(item, index), e.to_string())),
            }
        }
        if parsed.is_empty() {
            return Ok(Gate::Reject {
                error: "validation",
                message: "Failed to validate changeset".to_string(),
            });
        }
        ctx.changeset = Some(parsed);
        return Ok(Gate::Proceed);
    }

    if let Some(version_id) = ctx.version_id.clone() {
        let history = deps.registry.history().await?;
        if !history.iter().any(|v| v.id == version_id) {
            details.push(Detail::validation(
                format!("version:{version_id}"),
                format!("Version not found: {version_id}"),
            ));
            return Ok(Gate::Reject {
                error: "validation",
                message: "Failed to validate version ID".to_string(),
            });
        }
        return Ok(Gate::Proceed);
    }

    Ok(Gate::Reject {
        error: "validation",
        message: "No changeset or version ID provided".to_string(),
    })
}

/// Run the configured processors in ascending priority order.
///
/// Each processor sees the current context; its returned keys are merged
/// so the next processor (and the client) can see them, except `options`
/// and `user_id` which are restored after every step. A failing processor
/// aborts the pipeline with its verdict.
pub(crate) async fn run_processors(
    deps: &Deps,
    ctx: &mut Context,
    details: &mut Vec<Detail>,
) -> Result<Gate, WorkerError> {
    let original_options = ctx.options.clone();
    let original_user = ctx.user_id.clone();

    let processors = extensions::discover(&*deps.registry, PROCESSOR_TYPE).await?;
    for entry in &processors {
        let id = entry.id.to_string();
        let Some(handler) = deps.handlers.resolve(&id) else {
            tracing::error!(processor = %id, "processor has no registered handler");
            return Ok(Gate::Reject {
                error: "processor_failure",
                message: format!("Processor not registered: {id}"),
            });
        };

        tracing::debug!(processor = %id, "invoking processor");
        let verdict = handler.invoke(ctx).await;
        let Some(verdict) = verdict else {
            continue;
        };

        details.extend(verdict.details.iter().cloned());
        ctx.merge(&verdict.extra);
        ctx.restore(&original_options, &original_user);

        if !verdict.success {
            let message = verdict
                .message
                .unwrap_or_else(|| format!("Processor failed: {id}"));
            return Ok(Gate::Reject { error: "processor_failure", message });
        }
    }
    Ok(Gate::Proceed)
}

fn item_id(item: &Value, index: usize) -> String {
    item.get("entry")
        .and_then(|e| e.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("item:{index}"))
}

#[cfg(test)]
#[path = "preprocess_tests.rs"]
mod tests;
