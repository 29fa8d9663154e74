// SPDX-License-Identifier: MIT

//! Source tree loader
//!
//! Reads a directory tree of `_index.yaml` files back into registry
//! entries, resolving `file://` references against side files in the same
//! directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use gov_adapters::{Filesystem, FsError};
use gov_core::{Entry, EntryId};

use crate::sync::policy::SyncPolicy;
use crate::sync::INDEX_FILE;

#[derive(Debug, Error)]
pub(crate) enum LoadError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("source directory does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("bad entry in {path}: {message}")]
    BadEntry { path: PathBuf, message: String },
}

#[derive(Deserialize)]
struct IndexDoc {
    #[allow(dead_code)]
    version: String,
    namespace: String,
    #[serde(default)]
    #[allow(dead_code)]
    meta: Map<String, Value>,
    #[serde(default)]
    entries: Vec<Map<String, Value>>,
}

/// Load every entry under `base`, one `_index.yaml` per namespace.
pub(crate) async fn load_tree(
    fs: &dyn Filesystem,
    policy: &SyncPolicy,
    base: &Path,
) -> Result<Vec<Entry>, LoadError> {
    if !fs.exists(base).await {
        return Err(LoadError::MissingRoot(base.to_path_buf()));
    }

    let mut entries = Vec::new();
    let mut queue = vec![base.to_path_buf()];
    while let Some(dir) = queue.pop() {
        let mut index_path = None;
        for item in fs.list_dir(&dir).await? {
            if item.is_dir {
                queue.push(item.path);
            } else if item.path.file_name().is_some_and(|n| n == INDEX_FILE) {
                index_path = Some(item.path);
            }
        }
        if let Some(index_path) = index_path {
            entries.extend(load_index(fs, policy, &dir, &index_path).await?);
        }
    }
    Ok(entries)
}

async fn load_index(
    fs: &dyn Filesystem,
    policy: &SyncPolicy,
    dir: &Path,
    index_path: &Path,
) -> Result<Vec<Entry>, LoadError> {
    let raw = fs.read(index_path).await?;
    let doc: IndexDoc = serde_yaml::from_slice(&raw).map_err(|e| LoadError::Parse {
        path: index_path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut entries = Vec::with_capacity(doc.entries.len());
    for raw_entry in doc.entries {
        let mut entry = parse_entry(&doc.namespace, raw_entry, index_path)?;
        resolve_source_file(fs, policy, dir, &mut entry).await?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Split a flat index element into the structural fields (`name`, `kind`,
/// `meta`) and the per-kind data fields.
fn parse_entry(
    namespace: &str,
    mut raw: Map<String, Value>,
    index_path: &Path,
) -> Result<Entry, LoadError> {
    let bad = |message: String| LoadError::BadEntry {
        path: index_path.to_path_buf(),
        message,
    };

    let name = raw
        .remove("name")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| bad("missing 'name'".to_string()))?;
    let kind = raw
        .remove("kind")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| bad(format!("entry '{name}' is missing 'kind'")))?;
    let meta = match raw.remove("meta") {
        Some(Value::Object(meta)) => meta,
        Some(_) => return Err(bad(format!("entry '{name}' has a non-map 'meta'"))),
        None => Map::new(),
    };

    let id = EntryId::new(namespace, &name).map_err(|e| bad(e.to_string()))?;
    Ok(Entry { id, kind, meta, data: raw })
}

/// Inline the contents of the side file a `file://` source field points at.
async fn resolve_source_file(
    fs: &dyn Filesystem,
    policy: &SyncPolicy,
    dir: &Path,
    entry: &mut Entry,
) -> Result<(), LoadError> {
    let Some(rule) = policy.rule_for(entry) else {
        return Ok(());
    };
    let Some(reference) = entry.data_str(&rule.source_field) else {
        return Ok(());
    };
    let Some(filename) = reference.strip_prefix("file://") else {
        return Ok(());
    };

    let raw = fs.read(&dir.join(filename)).await?;
    let contents = String::from_utf8(raw).map_err(|e| LoadError::BadEntry {
        path: dir.join(filename),
        message: format!("side file is not UTF-8: {e}"),
    })?;
    entry.set_data(&rule.source_field, Value::String(contents));
    Ok(())
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
