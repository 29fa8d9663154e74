// SPDX-License-Identifier: MIT

//! Filesystem ↔ registry synchronizer
//!
//! The uploader diffs an on-disk source tree against the live snapshot and
//! emits a changeset; the downloader materializes the snapshot to disk,
//! externalizing source-bearing fields as side files and garbage-collecting
//! orphans.

mod download;
mod index;
mod loader;
mod policy;
mod upload;

pub use download::DownloadResult;
pub use policy::{MaterializeRule, SyncPolicy};
pub use upload::UploadResult;

pub(crate) use download::run as run_download;
pub(crate) use upload::run as run_upload;

/// Name of the per-namespace index file.
pub const INDEX_FILE: &str = "_index.yaml";
