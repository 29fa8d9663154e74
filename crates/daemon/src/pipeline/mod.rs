// SPDX-License-Identifier: MIT

//! The three-stage change pipeline: pre-process → execute → post-process
//!
//! The pre-processor validates the proposed change and runs the configured
//! processor chain; the executor applies the result to the registry; the
//! post-processor fans out to listeners. Details accumulate across all
//! three stages and survive failure.

mod context;
mod execute;
mod extensions;
mod postprocess;
mod preprocess;
pub mod processors;

pub use context::Context;
pub use extensions::{
    discover, Handler, HandlerRegistry, Verdict, LISTENER_TYPE, PROCESSOR_TYPE,
};

use serde_json::{Map, Value};

use gov_core::{Changeset, Options};
use gov_wire::Detail;

use crate::deps::Deps;
use crate::worker::WorkerError;

/// Input to one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    /// Raw operations as received from the client; shape validation happens
    /// in the pre-processor.
    pub raw_changeset: Option<Vec<Value>>,
    pub version_id: Option<String>,
    pub options: Options,
    pub user_id: Option<String>,
    pub request_id: String,
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct PipelineResult {
    pub success: bool,
    pub message: String,
    /// Machine-readable failure kind: `validation`, `processor_failure`,
    /// or `execution`.
    pub error: Option<String>,
    pub version: Option<String>,
    pub details: Vec<Detail>,
    /// Custom keys carried out of the processor chain.
    pub extra: Map<String, Value>,
    /// The changeset that was executed (the pre-processor's output).
    pub changeset: Option<Changeset>,
    pub user_id: Option<String>,
    pub request_id: String,
}

/// Verdict of a stage that can abort the pipeline.
pub(crate) enum Gate {
    Proceed,
    Reject { error: &'static str, message: String },
}

/// Run the full pipeline for a changeset or a version apply.
pub async fn run(deps: &Deps, input: PipelineInput) -> Result<PipelineResult, WorkerError> {
    let mut ctx = Context::new(
        input.version_id.clone(),
        input.options.clone(),
        input.user_id.clone(),
        input.request_id.clone(),
    );
    let mut details: Vec<Detail> = Vec::new();

    // Pre-process: shape validation, then the processor chain.
    let gate =
        preprocess::validate(deps, &mut ctx, input.raw_changeset.as_deref(), &mut details).await?;
    if let Gate::Reject { error, message } = gate {
        return Ok(failed(error, message, details, &ctx, input.request_id));
    }
    let gate = preprocess::run_processors(deps, &mut ctx, &mut details).await?;
    if let Gate::Reject { error, message } = gate {
        return Ok(failed(error, message, details, &ctx, input.request_id));
    }

    // Execute against the registry.
    let outcome = execute::run(deps, &ctx).await?;

    // Post-process: listeners only react to an executed changeset, and only
    // on success. A failed execution is returned untouched.
    if outcome.success && ctx.changeset.is_some() {
        postprocess::notify_listeners(deps, &ctx).await;
    }

    Ok(PipelineResult {
        success: outcome.success,
        message: outcome.message,
        error: outcome.error,
        version: outcome.version,
        details,
        extra: ctx.carried.clone(),
        changeset: ctx.changeset.clone(),
        user_id: input.user_id,
        request_id: input.request_id,
    })
}

fn failed(
    error: &'static str,
    message: String,
    details: Vec<Detail>,
    ctx: &Context,
    request_id: String,
) -> PipelineResult {
    PipelineResult {
        success: false,
        message,
        error: Some(error.to_string()),
        version: None,
        details,
        extra: ctx.carried.clone(),
        changeset: ctx.changeset.clone(),
        user_id: ctx.user_id.clone(),
        request_id,
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
