// SPDX-License-Identifier: MIT

//! Filesystem↔registry sync specs on the real local filesystem.

use serde_json::json;

use gov_core::Options;
use gov_store::{ChangeTx as _, Registry as _};

use crate::prelude::{lua_entry, version_events, Harness};

fn dir_options(base: &std::path::Path) -> Options {
    Options::new().with("directory", json!(base.display().to_string()))
}

fn read(path: &std::path::Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

#[tokio::test]
async fn download_materializes_a_source_bearing_entry() {
    let temp = tempfile::tempdir().expect("tempdir failed");
    let base = temp.path().join("registry");

    let harness = Harness::start().await;
    harness.registry.seed([lua_entry("a.b:x", "return 1")]);

    let outcome = harness
        .client
        .request_download(dir_options(&base))
        .await
        .expect("download failed");
    let stats = outcome.stats.expect("stats missing");
    assert_eq!(stats["namespaces"], 1);
    assert_eq!(stats["entries"], 1);
    assert_eq!(stats["files"], 1);

    assert_eq!(read(&base.join("a/b/x.lua")).as_deref(), Some("return 1"));
    let index = read(&base.join("a/b/_index.yaml")).expect("index missing");
    assert!(index.contains("source: file://x.lua"));
    assert!(index.starts_with("version: \"1.0\"\nnamespace: a.b\n\nentries:\n"));
}

#[tokio::test]
async fn download_after_entry_delete_collapses_the_namespace_tree() {
    let temp = tempfile::tempdir().expect("tempdir failed");
    let base = temp.path().join("registry");

    let harness = Harness::start().await;
    harness.registry.seed([lua_entry("a.b:x", "return 1")]);
    harness
        .client
        .request_download(dir_options(&base))
        .await
        .expect("first download failed");
    assert!(base.join("a/b/x.lua").exists());

    {
        let mut tx = harness.registry.changes().await.expect("changes failed");
        tx.delete(gov_core::EntryId::parse("a.b:x").expect("bad id"));
        tx.commit().await.expect("commit failed");
    }

    let outcome = harness
        .client
        .request_download(dir_options(&base))
        .await
        .expect("second download failed");
    let stats = outcome.stats.expect("stats missing");
    assert_eq!(stats["index_files_removed"], 1);
    assert!(stats["empty_namespaces_removed"].as_u64().unwrap_or(0) >= 2);

    assert!(!base.join("a/b/x.lua").exists());
    assert!(!base.join("a/b/_index.yaml").exists());
    assert!(!base.join("a/b").exists());
    assert!(!base.join("a").exists());
}

#[tokio::test]
async fn repeated_downloads_are_idempotent() {
    let temp = tempfile::tempdir().expect("tempdir failed");
    let base = temp.path().join("registry");

    let harness = Harness::start().await;
    harness.registry.seed([
        lua_entry("a:x", "return 1"),
        lua_entry("a:y", "return 2"),
    ]);
    harness.client.request_download(dir_options(&base)).await.expect("download failed");

    let outcome = harness
        .client
        .request_download(dir_options(&base))
        .await
        .expect("second download failed");
    let stats = outcome.stats.expect("stats missing");
    assert_eq!(stats["files"], 0);
    assert_eq!(stats["files_skipped"], 2);
    assert_eq!(stats["orphaned_files_removed"], 0);
    assert_eq!(stats["empty_namespaces_removed"], 0);
}

#[tokio::test]
async fn upload_round_trips_a_source_edit() {
    let temp = tempfile::tempdir().expect("tempdir failed");
    let base = temp.path().join("registry");

    let harness = Harness::start().await;
    harness.registry.seed([lua_entry("a:x", "return 1")]);
    harness.client.request_download(dir_options(&base)).await.expect("download failed");

    // In-sync tree: nothing to upload.
    let clean = harness
        .client
        .request_upload(dir_options(&base))
        .await
        .expect("clean upload failed");
    assert_eq!(clean.count, Some(0));
    assert_eq!(clean.has_changes, Some(false));

    // One edited source becomes one update.
    std::fs::write(base.join("a/x.lua"), "return 42").expect("write failed");
    let outcome = harness
        .client
        .request_upload(dir_options(&base))
        .await
        .expect("upload failed");
    assert_eq!(outcome.count, Some(1));
    let stats = outcome.stats.expect("stats missing");
    assert_eq!(stats["create"], 0);
    assert_eq!(stats["update"], 1);
    assert_eq!(stats["delete"], 0);

    let snapshot = harness.registry.snapshot().await.expect("snapshot failed");
    assert_eq!(snapshot.entries[0].data_str("source"), Some("return 42"));
    assert_eq!(version_events(&harness.bus).len(), 1);

    // Immediately after, the tree is in sync again.
    let again = harness
        .client
        .request_upload(dir_options(&base))
        .await
        .expect("repeat upload failed");
    assert_eq!(again.count, Some(0));
    assert_eq!(again.has_changes, Some(false));
    assert_eq!(version_events(&harness.bus).len(), 1);
}

#[tokio::test]
async fn check_orphans_lists_unreferenced_files() {
    let temp = tempfile::tempdir().expect("tempdir failed");
    let base = temp.path().join("registry");

    let harness = Harness::start().await;
    harness.registry.seed([lua_entry("a:x", "return 1")]);
    harness.client.request_download(dir_options(&base)).await.expect("download failed");
    std::fs::write(base.join("a/stale.lua"), "leftover").expect("write failed");

    let outcome = harness
        .client
        .request_download(dir_options(&base).with("check_orphans", json!(true)))
        .await
        .expect("orphan scan failed");
    let orphans = outcome.extra.get("orphaned_files").expect("orphan list missing");
    assert_eq!(orphans.as_array().map(Vec::len), Some(1));
    assert!(orphans[0].as_str().unwrap_or_default().ends_with("a/stale.lua"));
    // The scan mutated nothing.
    assert!(base.join("a/stale.lua").exists());
}
