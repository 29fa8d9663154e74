// SPDX-License-Identifier: MIT

//! Downloader: registry snapshot → directory tree
//!
//! Writes are idempotent: file content is compared byte-for-byte and only
//! written on mismatch. Orphan files and empty namespace directories are
//! garbage-collected unless the caller disables cleanup.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_json::Value;

use gov_adapters::{Filesystem, FsError};
use gov_core::{Entry, Options};
use gov_wire::DownloadStats;

use crate::deps::Deps;
use crate::env;
use crate::sync::index::render_index;
use crate::sync::policy::SyncPolicy;
use crate::sync::INDEX_FILE;
use crate::worker::{WorkerError, WorkerPayload};

/// Structured downloader result.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub success: bool,
    pub message: String,
    /// Snapshot version that was materialized.
    pub version: Option<String>,
    pub stats: DownloadStats,
    /// Orphan paths found by a `check_orphans` scan.
    pub orphans: Vec<String>,
}

impl DownloadResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            version: None,
            stats: DownloadStats::default(),
            orphans: Vec::new(),
        }
    }
}

/// Filenames entries reference, per namespace.
type Referenced = BTreeMap<String, BTreeSet<String>>;

/// Materialize the live snapshot under the target directory.
pub(crate) async fn run(deps: Deps, options: Options) -> Result<WorkerPayload, WorkerError> {
    let Some(base) = options
        .directory()
        .map(PathBuf::from)
        .or_else(env::source_dir)
    else {
        return Ok(WorkerPayload::Download(DownloadResult::failure(
            "No target directory configured",
        )));
    };

    let snapshot = deps.registry.snapshot().await?;
    let mut groups = group_by_namespace(&snapshot.entries);

    if options.check_orphans() {
        let orphans = scan_orphans(&*deps.filesystem, &deps.policy, &base, &groups).await?;
        return Ok(WorkerPayload::Download(DownloadResult {
            success: true,
            message: format!("Found {} orphaned files", orphans.len()),
            version: snapshot.version,
            stats: DownloadStats::default(),
            orphans,
        }));
    }

    let fs = &*deps.filesystem;
    fs.create_dir_all(&base).await?;

    let mut stats = DownloadStats::default();
    let mut written: BTreeSet<PathBuf> = BTreeSet::new();
    let mut referenced = Referenced::new();

    for (namespace, entries) in &mut groups {
        materialize_namespace(
            fs,
            &deps.policy,
            &base,
            namespace,
            entries,
            &mut stats,
            &mut written,
            &mut referenced,
        )
        .await?;
    }

    remove_deleted_side_files(fs, &deps.policy, &base, &options, &mut stats).await?;

    if options.cleanup_orphaned() {
        let active = active_namespaces(&groups);
        cleanup_orphans(fs, &base, &written, &referenced, &mut stats).await?;
        collapse_empty_namespaces(fs, &base, &active, &mut stats).await?;
    }

    let fs_id = options.filesystem().map(str::to_string).or_else(env::filesystem_id);
    tracing::info!(
        namespaces = stats.namespaces,
        entries = stats.entries,
        files = stats.files,
        files_skipped = stats.files_skipped,
        orphaned_files_removed = stats.orphaned_files_removed,
        empty_namespaces_removed = stats.empty_namespaces_removed,
        base = %base.display(),
        filesystem = ?fs_id,
        "download complete"
    );

    Ok(WorkerPayload::Download(DownloadResult {
        success: true,
        message: format!(
            "Downloaded {} entries across {} namespaces",
            stats.entries, stats.namespaces
        ),
        version: snapshot.version,
        stats,
        orphans: Vec::new(),
    }))
}

fn group_by_namespace(entries: &[Entry]) -> BTreeMap<String, Vec<Entry>> {
    let mut groups: BTreeMap<String, Vec<Entry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry(entry.id.namespace().to_string())
            .or_default()
            .push(entry.clone());
    }
    for entries in groups.values_mut() {
        entries.sort_by(|a, b| a.id.name().cmp(b.id.name()));
    }
    groups
}

fn ns_dir(base: &Path, namespace: &str) -> PathBuf {
    let mut dir = base.to_path_buf();
    for part in namespace.split('.') {
        dir.push(part);
    }
    dir
}

fn ns_of(base: &Path, dir: &Path) -> String {
    dir.strip_prefix(base)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default()
}

/// Target filename for a materialized source field.
fn side_filename(name: &str, extension: &str) -> String {
    if name.ends_with(extension) {
        name.to_string()
    } else {
        format!("{name}{extension}")
    }
}

#[allow(clippy::too_many_arguments)]
async fn materialize_namespace(
    fs: &dyn Filesystem,
    policy: &SyncPolicy,
    base: &Path,
    namespace: &str,
    entries: &mut [Entry],
    stats: &mut DownloadStats,
    written: &mut BTreeSet<PathBuf>,
    referenced: &mut Referenced,
) -> Result<(), WorkerError> {
    let dir = ns_dir(base, namespace);
    fs.create_dir_all(&dir).await?;

    for entry in entries.iter_mut() {
        stats.entries += 1;
        let Some(rule) = policy.rule_for(entry) else { continue };
        let Some(source) = entry.data_str(&rule.source_field).map(str::to_string) else {
            continue;
        };

        if let Some(filename) = source.strip_prefix("file://") {
            // Already externalized; record the reference so cleanup keeps it.
            referenced
                .entry(namespace.to_string())
                .or_default()
                .insert(filename.to_string());
            continue;
        }

        let filename = side_filename(entry.id.name(), &rule.extension);
        let path = dir.join(&filename);
        write_if_changed(fs, &path, source.as_bytes(), stats).await?;
        written.insert(path);
        referenced
            .entry(namespace.to_string())
            .or_default()
            .insert(filename.clone());
        entry.set_data(&rule.source_field, Value::String(format!("file://{filename}")));
    }
    stats.namespaces += 1;

    let index_path = dir.join(INDEX_FILE);
    let rendered = render_index(namespace, entries, policy);
    let existing = read_optional(fs, &index_path).await?;
    if existing.as_deref() != Some(rendered.as_bytes()) {
        fs.write(&index_path, rendered.as_bytes()).await?;
    }
    written.insert(index_path);
    Ok(())
}

/// Write only when content differs; count a write or a skip.
async fn write_if_changed(
    fs: &dyn Filesystem,
    path: &Path,
    desired: &[u8],
    stats: &mut DownloadStats,
) -> Result<(), FsError> {
    let existing = read_optional(fs, path).await?;
    if existing.as_deref() == Some(desired) {
        stats.files_skipped += 1;
    } else {
        fs.write(path, desired).await?;
        stats.files += 1;
    }
    Ok(())
}

async fn read_optional(fs: &dyn Filesystem, path: &Path) -> Result<Option<Vec<u8>>, FsError> {
    match fs.read(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(FsError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Remove side files of entries the caller reports as just deleted.
async fn remove_deleted_side_files(
    fs: &dyn Filesystem,
    policy: &SyncPolicy,
    base: &Path,
    options: &Options,
    stats: &mut DownloadStats,
) -> Result<(), WorkerError> {
    for entry in options.deleted_entries() {
        let Some(rule) = policy.rule_for(&entry) else { continue };
        let filename = entry
            .data_str(&rule.source_field)
            .and_then(|s| s.strip_prefix("file://"))
            .map(str::to_string)
            .unwrap_or_else(|| side_filename(entry.id.name(), &rule.extension));
        let path = ns_dir(base, entry.id.namespace()).join(&filename);
        match fs.remove_file(&path).await {
            Ok(()) => stats.deleted += 1,
            Err(FsError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Every directory and file under `base`, excluding `base` itself.
async fn walk(
    fs: &dyn Filesystem,
    base: &Path,
) -> Result<(Vec<PathBuf>, Vec<PathBuf>), FsError> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    let mut queue = vec![base.to_path_buf()];
    while let Some(dir) = queue.pop() {
        for item in fs.list_dir(&dir).await? {
            if item.is_dir {
                dirs.push(item.path.clone());
                queue.push(item.path);
            } else {
                files.push(item.path);
            }
        }
    }
    Ok((dirs, files))
}

fn is_index(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == INDEX_FILE)
}

fn is_referenced(base: &Path, referenced: &Referenced, file: &Path) -> bool {
    let Some(parent) = file.parent() else { return false };
    let namespace = ns_of(base, parent);
    let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return false;
    };
    referenced.get(&namespace).is_some_and(|set| set.contains(&name))
}

/// Delete files that were neither written this run nor referenced by any
/// entry.
async fn cleanup_orphans(
    fs: &dyn Filesystem,
    base: &Path,
    written: &BTreeSet<PathBuf>,
    referenced: &Referenced,
    stats: &mut DownloadStats,
) -> Result<(), WorkerError> {
    let (_dirs, files) = walk(fs, base).await?;
    for file in files {
        if is_index(&file) || written.contains(&file) || is_referenced(base, referenced, &file) {
            continue;
        }
        tracing::warn!(path = %file.display(), "removing orphaned file");
        fs.remove_file(&file).await?;
        stats.orphaned_files_removed += 1;
    }
    Ok(())
}

/// Remove index files and directories of namespaces that no longer hold
/// entries. Deepest directories first so nested empty namespaces collapse
/// in one pass.
async fn collapse_empty_namespaces(
    fs: &dyn Filesystem,
    base: &Path,
    active: &BTreeSet<String>,
    stats: &mut DownloadStats,
) -> Result<(), WorkerError> {
    let (mut dirs, _files) = walk(fs, base).await?;
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));

    for dir in dirs {
        let namespace = ns_of(base, &dir);
        if active.contains(&namespace) {
            continue;
        }

        match fs.remove_file(&dir.join(INDEX_FILE)).await {
            Ok(()) => stats.index_files_removed += 1,
            Err(FsError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        // Stray non-index files in an inactive namespace: delete, then retry
        // the directory removal.
        for item in fs.list_dir(&dir).await? {
            if !item.is_dir {
                tracing::warn!(path = %item.path.display(), "removing stray file in inactive namespace");
                fs.remove_file(&item.path).await?;
                stats.orphaned_files_removed += 1;
            }
        }

        match fs.remove_dir(&dir).await {
            Ok(()) => stats.empty_namespaces_removed += 1,
            // A child namespace is still active; leave the ancestor alone.
            Err(FsError::NotEmpty(_)) | Err(FsError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// A namespace stays active while it holds entries or is an ancestor of one
/// that does.
fn active_namespaces(groups: &BTreeMap<String, Vec<Entry>>) -> BTreeSet<String> {
    let mut active = BTreeSet::new();
    for namespace in groups.keys() {
        let mut prefix = String::new();
        for part in namespace.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(part);
            active.insert(prefix.clone());
        }
    }
    active
}

/// Read-only orphan scan: report files no entry references, touch nothing.
async fn scan_orphans(
    fs: &dyn Filesystem,
    policy: &SyncPolicy,
    base: &Path,
    groups: &BTreeMap<String, Vec<Entry>>,
) -> Result<Vec<String>, WorkerError> {
    if !fs.exists(base).await {
        return Ok(Vec::new());
    }

    let mut referenced = Referenced::new();
    for (namespace, entries) in groups {
        for entry in entries {
            let Some(rule) = policy.rule_for(entry) else { continue };
            let Some(source) = entry.data_str(&rule.source_field) else { continue };
            let filename = source
                .strip_prefix("file://")
                .map(str::to_string)
                .unwrap_or_else(|| side_filename(entry.id.name(), &rule.extension));
            referenced.entry(namespace.clone()).or_default().insert(filename);
        }
    }

    let (_dirs, files) = walk(fs, base).await?;
    let orphans = files
        .into_iter()
        .filter(|file| !is_index(file) && !is_referenced(base, &referenced, file))
        .map(|file| file.display().to_string())
        .collect();
    Ok(orphans)
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
