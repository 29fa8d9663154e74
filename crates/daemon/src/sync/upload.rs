// SPDX-License-Identifier: MIT

//! Uploader: source tree → registry delta

use std::path::PathBuf;

use serde_json::Value;

use gov_core::{ChangeKind, Changeset, Options};
use gov_wire::UploadStats;

use crate::deps::Deps;
use crate::env;
use crate::sync::loader;
use crate::worker::{WorkerError, WorkerPayload};

/// Sources longer than this are replaced by a placeholder in the formatted
/// changeset.
const DISPLAY_SOURCE_LIMIT: usize = 1000;

/// Structured uploader result.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub success: bool,
    pub message: String,
    pub changeset: Changeset,
    pub count: usize,
    pub stats: UploadStats,
    /// Display form of the delta, sources truncated.
    pub formatted_changeset: Vec<Value>,
    pub has_changes: bool,
}

impl UploadResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            changeset: Changeset::new(),
            count: 0,
            stats: UploadStats::default(),
            formatted_changeset: Vec::new(),
            has_changes: false,
        }
    }
}

/// Diff the source tree against the live snapshot.
pub(crate) async fn run(deps: Deps, options: Options) -> Result<WorkerPayload, WorkerError> {
    let Some(directory) = options
        .directory()
        .map(PathBuf::from)
        .or_else(env::source_dir)
    else {
        return Ok(WorkerPayload::Upload(UploadResult::failure(
            "No source directory configured",
        )));
    };

    let snapshot = deps.registry.snapshot().await?;
    let target = match loader::load_tree(&*deps.filesystem, &deps.policy, &directory).await {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(error = %e, directory = %directory.display(), "source tree load failed");
            return Ok(WorkerPayload::Upload(UploadResult::failure(format!(
                "Failed to load source tree: {e}"
            ))));
        }
    };

    let changeset = deps.registry.build_delta(&snapshot.entries, &target);
    let mut stats = UploadStats::default();
    for op in &changeset {
        match op.kind() {
            ChangeKind::Create => stats.create += 1,
            ChangeKind::Update => stats.update += 1,
            ChangeKind::Delete => stats.delete += 1,
        }
    }
    let count = stats.total();
    let formatted_changeset = changeset.iter().map(format_op).collect();

    let fs_id = options.filesystem().map(str::to_string).or_else(env::filesystem_id);
    tracing::info!(
        count,
        create = stats.create,
        update = stats.update,
        delete = stats.delete,
        directory = %directory.display(),
        filesystem = ?fs_id,
        "upload delta built"
    );

    Ok(WorkerPayload::Upload(UploadResult {
        success: true,
        message: format!("Found {count} changes"),
        changeset,
        count,
        stats,
        formatted_changeset,
        has_changes: count > 0,
    }))
}

/// Display form of one operation with oversized sources replaced.
fn format_op(op: &gov_core::ChangeOp) -> Value {
    let mut value = serde_json::to_value(op).unwrap_or(Value::Null);
    if let Some(source) = value
        .get_mut("entry")
        .and_then(|e| e.get_mut("data"))
        .and_then(|d| d.get_mut("source"))
    {
        if let Some(s) = source.as_str() {
            if s.len() > DISPLAY_SOURCE_LIMIT {
                *source = Value::String(format!("<source: {} bytes>", s.len()));
            }
        }
    }
    value
}

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;
