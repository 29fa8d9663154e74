// SPDX-License-Identifier: MIT

//! Statistics records for the sync operations

use serde::{Deserialize, Serialize};

/// Per-kind operation counts produced by the uploader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UploadStats {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

impl UploadStats {
    pub fn total(&self) -> usize {
        self.create + self.update + self.delete
    }
}

/// Counters reported by the downloader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DownloadStats {
    pub namespaces: usize,
    pub entries: usize,
    /// Side files written this run.
    pub files: usize,
    /// Side files whose content already matched.
    pub files_skipped: usize,
    /// Side files removed for deleted entries.
    pub deleted: usize,
    pub orphaned_files_removed: usize,
    pub empty_namespaces_removed: usize,
    pub index_files_removed: usize,
}
